//! The image a user supplied, plus its derived representations.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use once_cell::sync::OnceCell;
use scanchat_core::{ScanError, ScanResult};
use tracing::info;
use uuid::Uuid;

use crate::display::{DisplayHandle, DisplayRegistry};
use crate::mime_detect::{detect_mime_type, is_image, sniff_mime_type};

/// Immutable image payload with a display URI and a lazily built data URI.
///
/// Dropping the artifact releases its display URI.
#[derive(Debug)]
pub struct ImageArtifact {
    id: Uuid,
    bytes: Bytes,
    mime_type: String,
    display: DisplayHandle,
    data_uri: OnceCell<String>,
}

impl ImageArtifact {
    /// Build an artifact from raw bytes (file pick, drag, or clipboard paste).
    ///
    /// `mime_hint` is what the source claimed; when absent the type is sniffed
    /// from the payload. Non-image content is rejected.
    pub fn from_bytes(
        bytes: impl Into<Bytes>,
        mime_hint: Option<&str>,
        registry: &DisplayRegistry,
    ) -> ScanResult<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(ScanError::InvalidInput("empty image payload".into()));
        }
        let mime_type = match mime_hint {
            Some(mime) => mime.trim().to_ascii_lowercase(),
            None => sniff_mime_type(&bytes)
                .ok_or_else(|| ScanError::InvalidInput("unsupported file type".into()))?
                .to_string(),
        };
        Self::build(bytes, mime_type, registry)
    }

    /// Read an image file from disk. Content sniffing wins over the extension.
    pub async fn from_path(path: &Path, registry: &DisplayRegistry) -> ScanResult<Self> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            ScanError::InvalidInput(format!("cannot read {}: {e}", path.display()))
        })?;
        let mime_type = sniff_mime_type(&data)
            .unwrap_or_else(|| detect_mime_type(path))
            .to_string();
        Self::build(Bytes::from(data), mime_type, registry)
    }

    fn build(bytes: Bytes, mime_type: String, registry: &DisplayRegistry) -> ScanResult<Self> {
        if !is_image(&mime_type) {
            return Err(ScanError::InvalidInput(format!(
                "unsupported file type: {mime_type}"
            )));
        }
        let display = registry.register(bytes.clone(), &mime_type);
        let id = Uuid::new_v4();
        info!(artifact_id = %id, mime = %mime_type, size = bytes.len(), "Image artifact created");
        Ok(Self {
            id,
            bytes,
            mime_type,
            display,
            data_uri: OnceCell::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Process-local URI usable for rendering while this artifact lives.
    pub fn display_uri(&self) -> &str {
        self.display.uri()
    }

    /// `data:<mime>;base64,<payload>`, computed on first use and cached.
    pub fn data_uri(&self) -> &str {
        self.data_uri.get_or_init(|| {
            format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
        })
    }
}

/// Split a `data:<mime>;base64,<payload>` URI into its MIME type and payload.
pub fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    Some((mime, payload))
}
