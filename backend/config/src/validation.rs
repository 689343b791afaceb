//! Config validation with user-friendly messages.
//!
//! Ill-shaped keys are only warned about; the provider is the authority on
//! whether a key works.

use scanchat_core::CredentialSlot;
use thiserror::Error;

use crate::schema::ScanChatConfig;

#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &ScanChatConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_credentials(config, &mut report);
    validate_providers(config, &mut report);
    validate_http(config, &mut report);
    validate_local(config, &mut report);
    report
}

fn validate_credentials(config: &ScanChatConfig, report: &mut ValidationReport) {
    let Some(section) = &config.credentials else { return };
    for (slot, field) in [
        (CredentialSlot::OpenAi, "openaiApiKey"),
        (CredentialSlot::Gemini, "geminiApiKey"),
    ] {
        let Some(value) = section.slot(slot).map(str::trim).filter(|v| !v.is_empty()) else {
            continue;
        };
        if !slot.is_well_formed(value) {
            report.warn(
                format!("credentials.{field}"),
                format!(
                    "{slot} keys usually start with \"{}\" and are longer than 20 characters",
                    slot.key_prefix()
                ),
            );
        }
    }
}

fn validate_providers(config: &ScanChatConfig, report: &mut ValidationReport) {
    let openai = config.openai();
    let gemini = config.gemini();
    for (path, url) in [
        ("providers.openai.baseUrl", openai.base_url.as_deref()),
        ("providers.gemini.baseUrl", gemini.base_url.as_deref()),
    ] {
        if let Some(url) = url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                report.error(path, format!("Base URL must be http(s): {url}"));
            }
        }
    }
    for (path, tokens) in [
        ("providers.openai.visionMaxTokens", openai.vision_max_tokens),
        ("providers.openai.chatMaxTokens", openai.chat_max_tokens),
    ] {
        if tokens == Some(0) {
            report.error(path, "Max tokens must be > 0");
        }
    }
}

fn validate_http(config: &ScanChatConfig, report: &mut ValidationReport) {
    if config.http_timeout_secs() == 0 {
        report.error("http.timeoutSecs", "Timeout must be > 0 seconds");
    }
}

fn validate_local(config: &ScanChatConfig, report: &mut ValidationReport) {
    if config.tesseract_languages().trim().is_empty() {
        report.error("local.languages", "Tesseract language list cannot be empty");
    }
}
