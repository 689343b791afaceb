//! Log Redaction Layer
//!
//! Scrubs provider API keys and access tokens from strings prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static OPENAI_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"sk-[A-Za-z0-9_\-]{16,}").unwrap());
static GOOGLE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"AIza[A-Za-z0-9_\-]{16,}").unwrap());
static BEARER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bearer\s+[A-Za-z0-9\-\._~+/]+=*").unwrap());
static KEY_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([?&]key=)[^&\s]+").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = BEARER_RE.replace_all(input, "Bearer [REDACTED_TOKEN]");
    let redacted = KEY_PARAM_RE.replace_all(&redacted, "${1}[REDACTED_TOKEN]");
    let redacted = OPENAI_KEY_RE.replace_all(&redacted, "[REDACTED_TOKEN]");
    GOOGLE_KEY_RE.replace_all(&redacted, "[REDACTED_TOKEN]").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction() {
        let raw = "auth Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9 with sk-proj0123456789abcdefXYZ";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"));
        assert!(!clean.contains("sk-proj0123456789abcdefXYZ"));
        assert!(clean.starts_with("auth Bearer [REDACTED_TOKEN]"));
    }

    #[test]
    fn redacts_query_key_and_bare_google_key() {
        let clean = redact_sensitive_data(
            "POST /v1beta/models/gemini:generateContent?key=AIzaSyABCDEFGHIJKLMNOPQRSTUV&alt=json",
        );
        assert_eq!(
            clean,
            "POST /v1beta/models/gemini:generateContent?key=[REDACTED_TOKEN]&alt=json"
        );
        assert_eq!(
            redact_sensitive_data("key AIzaSyABCDEFGHIJKLMNOPQRSTUV set"),
            "key [REDACTED_TOKEN] set"
        );
    }

    #[test]
    fn leaves_ordinary_text_alone() {
        let text = "Rechnung Nr. 2024-17, total 42,00 EUR";
        assert_eq!(redact_sensitive_data(text), text);
    }
}
