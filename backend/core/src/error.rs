use thiserror::Error;

use crate::credentials::CredentialSlot;

/// Top-level error type for ScanChat recognition and chat operations.
#[derive(Debug, Error)]
pub enum ScanError {
    /// An engine or chat call needs a credential slot that is empty.
    #[error("{slot} API key required")]
    CredentialMissing { slot: CredentialSlot },

    /// Non-2xx response or network-level failure. `message` is already the
    /// best human-readable text available (provider message or generic fallback).
    #[error("{message}")]
    Transport { provider: String, message: String },

    /// Rejected locally before any call was attempted.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A chat request is already in flight for this session.
    #[error("a request is already in progress for this session")]
    SessionBusy,

    /// The session was reset while this request was in flight; its reply was dropped.
    #[error("superseded by a newer request")]
    Superseded,

    /// The local recognition pipeline failed.
    #[error("{0}")]
    Recognition(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScanError {
    pub fn transport(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// True for failures detected before any asynchronous call was made.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ScanError::CredentialMissing { .. } | ScanError::InvalidInput(_) | ScanError::SessionBusy
        )
    }
}

pub type ScanResult<T> = Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_displays_message_verbatim() {
        let err = ScanError::transport("openai", "quota exceeded");
        assert_eq!(err.to_string(), "quota exceeded");
    }

    #[test]
    fn credential_missing_names_slot() {
        let err = ScanError::CredentialMissing {
            slot: CredentialSlot::Gemini,
        };
        assert_eq!(err.to_string(), "Gemini API key required");
        assert!(err.is_precondition());
    }

    #[test]
    fn transport_is_not_precondition() {
        assert!(!ScanError::transport("gemini", "boom").is_precondition());
    }
}
