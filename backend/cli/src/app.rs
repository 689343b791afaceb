//! Wiring from configuration to a ready [`Workbench`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use scanchat_agent::{OpenAiChatTransport, Workbench};
use scanchat_config::{config_dir, config_file_path, default_log_dir, ScanChatConfig};
use scanchat_core::EngineId;
use scanchat_understanding::{build_client, EngineRegistry, GeminiVision, LocalEngine, OpenAiVision};
use tracing::info;

/// Resolve the config file from the `--config` flag or the config directory.
pub fn resolve_config_path(flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| config_file_path(&config_dir()))
}

pub fn log_dir(config: &ScanChatConfig) -> PathBuf {
    config
        .log_dir()
        .map(PathBuf::from)
        .unwrap_or_else(|| default_log_dir(&config_dir()))
}

/// Every engine, configured from the file, sharing one HTTP client.
pub fn build_engines(config: &ScanChatConfig) -> Result<(EngineRegistry, reqwest::Client)> {
    let client = build_client(Duration::from_secs(config.http_timeout_secs()))
        .context("Failed to build HTTP client")?;
    let openai = config.openai();
    let gemini = config.gemini();

    let mut vision = OpenAiVision::new(client.clone());
    if let Some(url) = openai.base_url {
        vision = vision.with_base_url(url);
    }
    if let Some(model) = openai.vision_model {
        vision = vision.with_model(model);
    }
    if let Some(tokens) = openai.vision_max_tokens {
        vision = vision.with_max_tokens(tokens);
    }

    let mut gemini_vision = GeminiVision::new(client.clone());
    if let Some(url) = gemini.base_url {
        gemini_vision = gemini_vision.with_base_url(url);
    }
    if let Some(model) = gemini.model {
        gemini_vision = gemini_vision.with_model(model);
    }

    let registry = EngineRegistry::new()
        .with(LocalEngine::tesseract(config.tesseract_path(), config.tesseract_languages()))
        .with(vision)
        .with(gemini_vision);
    Ok((registry, client))
}

pub fn build_workbench(config: &ScanChatConfig, engine: Option<EngineId>) -> Result<Workbench> {
    let (engines, client) = build_engines(config)?;
    let openai = config.openai();

    let mut transport = OpenAiChatTransport::new(client);
    if let Some(url) = openai.base_url {
        transport = transport.with_base_url(url);
    }
    if let Some(model) = openai.chat_model {
        transport = transport.with_model(model);
    }
    if let Some(tokens) = openai.chat_max_tokens {
        transport = transport.with_max_tokens(tokens);
    }

    let engine = engine.unwrap_or_default();
    info!(engine = %engine, auto_reprocess = config.auto_reprocess(), "Workbench ready");
    Ok(Workbench::new(engines, Arc::new(transport))
        .with_credentials(config.credentials())
        .with_selected_engine(engine)
        .with_auto_reprocess(config.auto_reprocess()))
}
