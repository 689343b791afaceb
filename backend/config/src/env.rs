//! Environment variable handling for config values.
//!
//! `${VAR_NAME}` in any string value is resolved at load time; only uppercase
//! `[A-Z_][A-Z0-9_]*` names match and `$${VAR}` escapes to a literal `${VAR}`.
//! Empty credential slots are then filled from `OPENAI_API_KEY` /
//! `GEMINI_API_KEY`.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scanchat_core::CredentialSlot;
use serde_json::Value;
use std::collections::HashMap;

use crate::schema::{CredentialsConfig, ScanChatConfig};

/// Matches `${VAR}` and its escaped form `$${VAR}`.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Environment variable that backs each credential slot.
pub fn credential_env_var(slot: CredentialSlot) -> &'static str {
    match slot {
        CredentialSlot::OpenAi => "OPENAI_API_KEY",
        CredentialSlot::Gemini => "GEMINI_API_KEY",
    }
}

/// Substitute `${VAR}` references using the process environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute `${VAR}` references using a provided map.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => arr
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() { k.clone() } else { format!("{path}.{k}") };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let whole = &caps[0];
        let var_name = &caps[1];
        if whole.starts_with("$$") {
            return format!("${{{var_name}}}");
        }
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: var_name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }
    Ok(substituted.into_owned())
}

/// Fill empty credential slots from the process environment.
pub fn apply_credential_env(config: ScanChatConfig) -> ScanChatConfig {
    apply_credential_env_with(config, &std::env::vars().collect())
}

pub fn apply_credential_env_with(mut config: ScanChatConfig, env: &HashMap<String, String>) -> ScanChatConfig {
    for slot in [CredentialSlot::OpenAi, CredentialSlot::Gemini] {
        let Some(value) = env.get(credential_env_var(slot)).filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        let section = config.credentials.get_or_insert_with(CredentialsConfig::default);
        let current = section.slot_mut(slot);
        if current.as_deref().map_or(true, |v| v.trim().is_empty()) {
            *current = Some(value.clone());
        }
    }
    config
}
