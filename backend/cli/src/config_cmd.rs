//! CLI Config Subcommands
//!
//! Inspect, validate and edit the ScanChat config file.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use scanchat_config::schema::CredentialsConfig;
use scanchat_config::{load_and_prepare, load_config, mask_secret, redact, validate, write_config};
use scanchat_core::CredentialSlot;

use crate::terminal_output::{note_error, note_info, note_success, note_warn};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective config with secrets masked
    Show,
    /// Validate the config file
    Check,
    /// Print the config file path
    Path,
    /// Store an API key in the config file
    SetKey {
        #[arg(value_enum)]
        slot: SlotArg,
        /// Key value; pass an empty string to clear the slot
        value: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SlotArg {
    Openai,
    Gemini,
}

impl From<SlotArg> for CredentialSlot {
    fn from(arg: SlotArg) -> Self {
        match arg {
            SlotArg::Openai => CredentialSlot::OpenAi,
            SlotArg::Gemini => CredentialSlot::Gemini,
        }
    }
}

pub async fn run(cmd: ConfigCommands, path: &Path) -> Result<()> {
    match cmd {
        ConfigCommands::Show => {
            let (config, _) = load_and_prepare(path).await?;
            let value = serde_json::to_value(&config).context("Failed to serialize config")?;
            print!("{}", serde_yaml::to_string(&redact(&value))?);
        }
        ConfigCommands::Check => {
            let (_, report) = load_and_prepare(path).await?;
            for warning in &report.warnings {
                note_warn(&format!("{}: {}", warning.path, warning.message));
            }
            for error in &report.errors {
                note_error(&format!("{}: {}", error.path, error.message));
            }
            if !report.is_valid() {
                anyhow::bail!("{} config error(s) in {}", report.errors.len(), path.display());
            }
            note_success(&format!("{} is valid", path.display()));
        }
        ConfigCommands::Path => println!("{}", path.display()),
        ConfigCommands::SetKey { slot, value } => {
            let slot = CredentialSlot::from(slot);
            // Raw file, so `${VAR}` references elsewhere survive the rewrite.
            let mut config = load_config(path).await?;
            let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
            if let Some(key) = &value {
                if !slot.is_well_formed(key) {
                    note_warn(&format!(
                        "{slot} keys usually start with \"{}\"; saving anyway",
                        slot.key_prefix()
                    ));
                }
            }
            let masked = value.as_deref().map(mask_secret);
            *config
                .credentials
                .get_or_insert_with(CredentialsConfig::default)
                .slot_mut(slot) = value;
            if !validate(&config).is_valid() {
                note_warn("Config has other errors; run `scanchat config check`");
            }
            write_config(&config, path).await?;
            match masked {
                Some(masked) => note_success(&format!("{slot} key set to {masked}")),
                None => note_info(&format!("{slot} key cleared")),
            }
        }
    }
    Ok(())
}
