//! ScanChat runtime configuration schema.
//!
//! Every section is optional in the file; [`crate::apply_all_defaults`] fills
//! the gaps and the accessors fall back to the same defaults.

use scanchat_core::{CredentialSlot, Credentials};
use serde::{Deserialize, Serialize};

use crate::defaults::*;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanChatConfig {
    /// Provider API keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<CredentialsConfig>,

    /// Remote provider endpoints and models
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub providers: Option<ProvidersConfig>,

    /// Local tesseract pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<LocalConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpConfig>,

    /// Workbench behaviour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
}

impl CredentialsConfig {
    pub fn slot(&self, slot: CredentialSlot) -> Option<&str> {
        match slot {
            CredentialSlot::OpenAi => self.openai_api_key.as_deref(),
            CredentialSlot::Gemini => self.gemini_api_key.as_deref(),
        }
    }

    pub fn slot_mut(&mut self, slot: CredentialSlot) -> &mut Option<String> {
        match slot {
            CredentialSlot::OpenAi => &mut self.openai_api_key,
            CredentialSlot::Gemini => &mut self.gemini_api_key,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidersConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<OpenAiConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<GeminiConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision_max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tesseract_path: Option<String>,
    /// Tesseract language spec, e.g. `deu+eng`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Re-run recognition when the engine changes with an image loaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_reprocess: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Log directory; defaults to `<config dir>/logs`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

// ---------------------------------------------------------------------------
// Resolved accessors
// ---------------------------------------------------------------------------

impl ScanChatConfig {
    /// Credentials as handed to the engines and the chat session.
    pub fn credentials(&self) -> Credentials {
        let mut credentials = Credentials::new();
        if let Some(section) = &self.credentials {
            for slot in [CredentialSlot::OpenAi, CredentialSlot::Gemini] {
                credentials.set(slot, section.slot(slot).map(str::to_string));
            }
        }
        credentials
    }

    pub fn openai(&self) -> OpenAiConfig {
        let section = self.providers.as_ref().and_then(|p| p.openai.clone()).unwrap_or_default();
        OpenAiConfig {
            base_url: Some(section.base_url.unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.into())),
            vision_model: Some(section.vision_model.unwrap_or_else(|| DEFAULT_OPENAI_MODEL.into())),
            chat_model: Some(section.chat_model.unwrap_or_else(|| DEFAULT_OPENAI_MODEL.into())),
            vision_max_tokens: Some(section.vision_max_tokens.unwrap_or(DEFAULT_VISION_MAX_TOKENS)),
            chat_max_tokens: Some(section.chat_max_tokens.unwrap_or(DEFAULT_CHAT_MAX_TOKENS)),
        }
    }

    pub fn gemini(&self) -> GeminiConfig {
        let section = self.providers.as_ref().and_then(|p| p.gemini.clone()).unwrap_or_default();
        GeminiConfig {
            base_url: Some(section.base_url.unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into())),
            model: Some(section.model.unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into())),
        }
    }

    pub fn tesseract_path(&self) -> &str {
        self.local
            .as_ref()
            .and_then(|l| l.tesseract_path.as_deref())
            .unwrap_or(DEFAULT_TESSERACT_PATH)
    }

    pub fn tesseract_languages(&self) -> &str {
        self.local
            .as_ref()
            .and_then(|l| l.languages.as_deref())
            .unwrap_or(DEFAULT_TESSERACT_LANGUAGES)
    }

    pub fn http_timeout_secs(&self) -> u64 {
        self.http
            .as_ref()
            .and_then(|h| h.timeout_secs)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
    }

    pub fn auto_reprocess(&self) -> bool {
        self.session
            .as_ref()
            .and_then(|s| s.auto_reprocess)
            .unwrap_or(DEFAULT_AUTO_REPROCESS)
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_json(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    pub fn log_dir(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.dir.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_yaml() {
        let yaml = r#"
credentials:
  openaiApiKey: sk-test-0123456789abcdef
providers:
  openai:
    chatModel: gpt-4o-mini
    visionMaxTokens: 2048
local:
  languages: eng
http:
  timeoutSecs: 15
session:
  autoReprocess: false
"#;
        let config: ScanChatConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.credentials().has(CredentialSlot::OpenAi));
        assert!(!config.credentials().has(CredentialSlot::Gemini));
        let openai = config.openai();
        assert_eq!(openai.chat_model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(openai.vision_model.as_deref(), Some(DEFAULT_OPENAI_MODEL));
        assert_eq!(openai.vision_max_tokens, Some(2048));
        assert_eq!(config.tesseract_languages(), "eng");
        assert_eq!(config.tesseract_path(), DEFAULT_TESSERACT_PATH);
        assert_eq!(config.http_timeout_secs(), 15);
        assert!(!config.auto_reprocess());
    }

    #[test]
    fn empty_config_resolves_to_defaults() {
        let config = ScanChatConfig::default();
        assert_eq!(config.gemini().model.as_deref(), Some(DEFAULT_GEMINI_MODEL));
        assert_eq!(config.http_timeout_secs(), DEFAULT_HTTP_TIMEOUT_SECS);
        assert!(config.auto_reprocess());
        assert_eq!(config.log_level(), DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let config = ScanChatConfig {
            credentials: Some(CredentialsConfig {
                gemini_api_key: Some("  ".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(!config.credentials().has(CredentialSlot::Gemini));
    }
}
