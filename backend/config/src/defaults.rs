//! Config defaults: applies default values to parsed config.

use crate::schema::{
    HttpConfig, LocalConfig, LoggingConfig, ProvidersConfig, ScanChatConfig, SessionConfig,
};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_VISION_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_CHAT_MAX_TOKENS: u32 = 1000;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

pub const DEFAULT_TESSERACT_PATH: &str = "tesseract";
pub const DEFAULT_TESSERACT_LANGUAGES: &str = "deu+eng";

/// Upper bound for every provider HTTP call.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_AUTO_REPROCESS: bool = true;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: ScanChatConfig) -> ScanChatConfig {
    let config = apply_provider_defaults(config);
    let config = apply_local_defaults(config);
    let config = apply_http_defaults(config);
    let config = apply_session_defaults(config);
    apply_logging_defaults(config)
}

fn apply_provider_defaults(mut config: ScanChatConfig) -> ScanChatConfig {
    let openai = config.openai();
    let gemini = config.gemini();
    let providers = config.providers.get_or_insert_with(ProvidersConfig::default);
    providers.openai = Some(openai);
    providers.gemini = Some(gemini);
    config
}

fn apply_local_defaults(mut config: ScanChatConfig) -> ScanChatConfig {
    let local = config.local.get_or_insert_with(LocalConfig::default);
    if local.tesseract_path.is_none() {
        local.tesseract_path = Some(DEFAULT_TESSERACT_PATH.to_string());
    }
    if local.languages.is_none() {
        local.languages = Some(DEFAULT_TESSERACT_LANGUAGES.to_string());
    }
    config
}

fn apply_http_defaults(mut config: ScanChatConfig) -> ScanChatConfig {
    let http = config.http.get_or_insert_with(HttpConfig::default);
    if http.timeout_secs.is_none() {
        http.timeout_secs = Some(DEFAULT_HTTP_TIMEOUT_SECS);
    }
    config
}

fn apply_session_defaults(mut config: ScanChatConfig) -> ScanChatConfig {
    let session = config.session.get_or_insert_with(SessionConfig::default);
    if session.auto_reprocess.is_none() {
        session.auto_reprocess = Some(DEFAULT_AUTO_REPROCESS);
    }
    config
}

fn apply_logging_defaults(mut config: ScanChatConfig) -> ScanChatConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    if logging.json.is_none() {
        logging.json = Some(false);
    }
    config
}
