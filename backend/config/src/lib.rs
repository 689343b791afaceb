//! `scanchat-config`: ScanChat runtime configuration.
//!
//! Provides:
//! - Typed config schema (credentials, providers, local OCR, HTTP, session, logging)
//! - YAML read/write with backup rotation
//! - `${ENV_VAR}` substitution and credential env fallbacks
//! - Config redaction for safe display
//! - Default value application and validation

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{apply_credential_env, credential_env_var, resolve_env_vars, MissingEnvVarError};
pub use io::{config_dir, config_file_path, default_log_dir, load_config, write_config, CONFIG_DIR_ENV};
pub use redact::{mask_secret, redact};
pub use schema::ScanChatConfig;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use std::path::Path;

/// Load a config file, substitute env vars, fill credentials from the
/// environment and apply defaults. Validation findings are logged; the
/// report is returned for callers that want to act on it.
pub async fn load_and_prepare(path: &Path) -> Result<(ScanChatConfig, ValidationReport)> {
    let raw_config = load_config(path).await?;
    let value = serde_json::to_value(&raw_config).context("Failed to serialize config for processing")?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    let config: ScanChatConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_all_defaults(apply_credential_env(config));

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    Ok((config, report))
}
