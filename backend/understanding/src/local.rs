//! Offline recognition through a locally installed tesseract.
//!
//! The pipeline sits behind [`LocalOcrBackend`] so the engine contract (fraction
//! progress, trimmed text, no partial results on failure) is independent of how
//! the pixels are actually read.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use scanchat_core::{ProgressSink, ScanError, ScanResult};
use scanchat_media::ImageArtifact;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{info, warn};

pub const DEFAULT_TESSERACT: &str = "tesseract";
pub const DEFAULT_LANGUAGES: &str = "deu+eng";

/// Message surfaced for any local pipeline failure.
pub const LOCAL_FAILURE_MESSAGE: &str = "Text recognition failed";

/// A text-recognition pipeline that runs on this machine.
#[async_trait]
pub trait LocalOcrBackend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Recognize text, reporting a 0.0..=1.0 fraction while recognizing.
    async fn recognize(&self, image: &ImageArtifact, progress: &ProgressSink) -> Result<String>;
}

/// Runs `tesseract stdin stdout -l <languages>` as a child process.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: PathBuf,
    languages: String,
}

impl TesseractCli {
    pub fn new(program: impl Into<PathBuf>, languages: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            languages: languages.into(),
        }
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new(DEFAULT_TESSERACT, DEFAULT_LANGUAGES)
    }
}

#[async_trait]
impl LocalOcrBackend for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, image: &ImageArtifact, progress: &ProgressSink) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(["stdin", "stdout", "-l", self.languages.as_str()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start {}", self.program.display()))?;

        progress.report_fraction(0.0);

        let mut stdin = child.stdin.take().context("tesseract stdin unavailable")?;
        let payload = image.bytes().clone();
        let writer = tokio::spawn(async move {
            let result = stdin.write_all(&payload).await;
            drop(stdin);
            result
        });

        let output = child
            .wait_with_output()
            .await
            .context("Failed to wait for tesseract")?;

        if !output.status.success() {
            bail!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        writer
            .await
            .context("tesseract stdin writer panicked")?
            .context("Failed to feed image to tesseract")?;

        progress.report_fraction(1.0);
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// The local engine: no credential, fraction progress, trimmed output.
#[derive(Clone)]
pub struct LocalEngine {
    backend: Arc<dyn LocalOcrBackend>,
}

impl LocalEngine {
    pub fn new(backend: Arc<dyn LocalOcrBackend>) -> Self {
        Self { backend }
    }

    pub fn tesseract(program: impl Into<PathBuf>, languages: impl Into<String>) -> Self {
        Self::new(Arc::new(TesseractCli::new(program, languages)))
    }

    pub async fn recognize(&self, artifact: &ImageArtifact, progress: &ProgressSink) -> ScanResult<String> {
        info!(backend = self.backend.name(), artifact_id = %artifact.id(), "Running local OCR");
        match self.backend.recognize(artifact, progress).await {
            Ok(text) => Ok(text.trim().to_string()),
            Err(e) => {
                warn!(backend = self.backend.name(), error = %format!("{e:#}"), "Local OCR failed");
                Err(ScanError::Recognition(LOCAL_FAILURE_MESSAGE.to_string()))
            }
        }
    }
}

impl Default for LocalEngine {
    fn default() -> Self {
        Self::new(Arc::new(TesseractCli::default()))
    }
}

impl std::fmt::Debug for LocalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalEngine")
            .field("backend", &self.backend.name())
            .finish()
    }
}
