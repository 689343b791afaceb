//! Config file read/write with atomic backup rotation.

use crate::schema::ScanChatConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Number of rolling backups to keep.
const MAX_BACKUPS: usize = 3;

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "SCANCHAT_CONFIG_DIR";

/// Resolve the ScanChat config directory.
/// Priority: `SCANCHAT_CONFIG_DIR` env > `~/.scanchat/`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    match dirs::home_dir() {
        Some(home) => home.join(".scanchat"),
        None => PathBuf::from(".scanchat"),
    }
}

/// Directory for rolling log files when the config does not name one.
pub fn default_log_dir(config_dir: &Path) -> PathBuf {
    config_dir.join("logs")
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Load and parse the config from disk.
///
/// Returns `Ok(Default::default())` if the file doesn't exist (first run).
pub async fn load_config(path: &Path) -> Result<ScanChatConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(ScanChatConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: ScanChatConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Write config to disk via a temp file and rename.
///
/// The previous file is kept as `config.yaml.bak.1` (older ones shift up).
/// On unix the file is created owner-only since it may hold API keys.
pub async fn write_config(config: &ScanChatConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }
    if path.exists() {
        rotate_backups(path).await;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    let tmp_path = path.with_extension("yaml.tmp");
    fs::write(&tmp_path, yaml.as_bytes())
        .await
        .with_context(|| format!("Failed to write temp config: {}", tmp_path.display()))?;
    restrict_permissions(&tmp_path).await?;
    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to rename temp config to: {}", path.display()))?;

    info!(path = %path.display(), "Wrote config");
    Ok(())
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .await
        .with_context(|| format!("Failed to restrict permissions on {}", path.display()))
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Shift `config.yaml.bak.N` up by one and copy the live file to `.bak.1`.
/// Failures only cost a backup, so they are logged and skipped.
async fn rotate_backups(path: &Path) {
    let backup = |n: usize| path.with_extension(format!("yaml.bak.{n}"));
    for i in (1..MAX_BACKUPS).rev() {
        let old = backup(i);
        if old.exists() {
            if let Err(e) = fs::rename(&old, backup(i + 1)).await {
                warn!(path = %old.display(), error = %e, "Failed to rotate config backup");
            }
        }
    }
    if let Err(e) = fs::copy(path, backup(1)).await {
        warn!(path = %path.display(), error = %e, "Failed to back up config");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CredentialsConfig, SessionConfig};

    #[tokio::test]
    async fn missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&config_file_path(dir.path())).await.unwrap();
        assert_eq!(config, ScanChatConfig::default());
    }

    #[tokio::test]
    async fn write_then_load_keeps_values_and_backs_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(&dir.path().join("nested"));
        let mut config = ScanChatConfig {
            session: Some(SessionConfig { auto_reprocess: Some(false) }),
            ..Default::default()
        };
        write_config(&config, &path).await.unwrap();

        config.credentials = Some(CredentialsConfig {
            gemini_api_key: Some("AIzaSyTEST0123456789abcdef".into()),
            ..Default::default()
        });
        write_config(&config, &path).await.unwrap();

        let loaded = load_config(&path).await.unwrap();
        assert_eq!(loaded, config);
        assert!(path.with_extension("yaml.bak.1").exists());
    }

    #[tokio::test]
    async fn malformed_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        tokio::fs::write(&path, "session: [unclosed").await.unwrap();
        let err = load_config(&path).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config YAML"));
    }
}
