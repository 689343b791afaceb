//! Config redaction for `scanchat config show`.

use serde_json::Value;

/// Field names holding secrets. Matched case-insensitively, by suffix, so
/// `openaiApiKey` and `geminiApiKey` are both covered.
static SECRET_SUFFIXES: &[&str] = &["apikey", "api_key", "token", "secret", "password"];

/// Replace every secret string with its first four characters plus `***`.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SECRET_SUFFIXES.iter().any(|suffix| key.ends_with(suffix))
}

pub fn mask_secret(secret: &str) -> String {
    if secret.chars().count() > 4 {
        format!("{}***", secret.chars().take(4).collect::<String>())
    } else {
        "***".to_string()
    }
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) if !s.is_empty() && is_sensitive_key(key) => Value::String(mask_secret(s)),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_recursive(v, k)))
                .collect(),
        ),
        other => other.clone(),
    }
}
