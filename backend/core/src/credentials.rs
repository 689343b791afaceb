//! Credential slots and their syntactic shape checks.
//!
//! Keys are only checked for shape (prefix + length). Whether a key actually
//! works is the provider's business; at call time the core only asks
//! "present or absent".

use std::fmt;

use serde::{Deserialize, Serialize};

/// Named secret slot consumed by one or more engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialSlot {
    /// First-party key: vision engine A and the chat transport.
    OpenAi,
    /// Second-party key: vision engine B.
    Gemini,
}

impl CredentialSlot {
    /// Fixed prefix every well-formed key for this slot starts with.
    pub fn key_prefix(self) -> &'static str {
        match self {
            CredentialSlot::OpenAi => "sk-",
            CredentialSlot::Gemini => "AIza",
        }
    }

    /// Syntactic check used by the collaborator UI to enable "save".
    pub fn is_well_formed(self, value: &str) -> bool {
        value.starts_with(self.key_prefix()) && value.len() > 20
    }
}

impl fmt::Display for CredentialSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSlot::OpenAi => write!(f, "OpenAI"),
            CredentialSlot::Gemini => write!(f, "Gemini"),
        }
    }
}

/// Explicit credential configuration handed to jobs and sessions.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    openai: Option<String>,
    gemini: Option<String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, slot: CredentialSlot, value: impl Into<String>) -> Self {
        self.set(slot, Some(value.into()));
        self
    }

    /// Store or clear a slot. Blank values clear it.
    pub fn set(&mut self, slot: CredentialSlot, value: Option<String>) {
        let value = value.filter(|v| !v.trim().is_empty());
        match slot {
            CredentialSlot::OpenAi => self.openai = value,
            CredentialSlot::Gemini => self.gemini = value,
        }
    }

    pub fn get(&self, slot: CredentialSlot) -> Option<&str> {
        match slot {
            CredentialSlot::OpenAi => self.openai.as_deref(),
            CredentialSlot::Gemini => self.gemini.as_deref(),
        }
    }

    pub fn has(&self, slot: CredentialSlot) -> bool {
        self.get(slot).is_some()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "***" } else { "<empty>" };
        f.debug_struct("Credentials")
            .field("openai", &mask(&self.openai))
            .field("gemini", &mask(&self.gemini))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_shape() {
        assert!(CredentialSlot::OpenAi.is_well_formed("sk-abcdefghijklmnopqrstu"));
        assert!(!CredentialSlot::OpenAi.is_well_formed("sk-short"));
        assert!(!CredentialSlot::OpenAi.is_well_formed("pk-abcdefghijklmnopqrstu"));
    }

    #[test]
    fn gemini_shape() {
        assert!(CredentialSlot::Gemini.is_well_formed("AIzaSyabcdefghijklmnopq"));
        // exactly 20 chars is not enough
        assert!(!CredentialSlot::Gemini.is_well_formed("AIza0123456789abcdef"));
    }

    #[test]
    fn blank_value_clears_slot() {
        let mut creds = Credentials::new().with(CredentialSlot::OpenAi, "sk-x");
        assert!(creds.has(CredentialSlot::OpenAi));
        creds.set(CredentialSlot::OpenAi, Some("   ".into()));
        assert!(!creds.has(CredentialSlot::OpenAi));
    }

    #[test]
    fn debug_never_prints_keys() {
        let creds = Credentials::new().with(CredentialSlot::Gemini, "AIzaSECRETSECRETSECRET");
        let printed = format!("{creds:?}");
        assert!(!printed.contains("SECRET"));
    }
}
