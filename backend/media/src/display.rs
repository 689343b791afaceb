//! Process-local display URIs for image artifacts.
//!
//! A registered payload stays resolvable for as long as its [`DisplayHandle`]
//! lives; dropping the handle revokes the URI so swapped-out images do not
//! leak.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tracing::debug;
use uuid::Uuid;

const URI_SCHEME: &str = "blob:scanchat/";

#[derive(Debug, Clone)]
struct DisplayEntry {
    mime_type: String,
    data: Bytes,
}

/// Registry of live display URIs. Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct DisplayRegistry {
    entries: Arc<Mutex<HashMap<String, DisplayEntry>>>,
}

impl DisplayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payload and return the handle owning its URI.
    pub fn register(&self, data: Bytes, mime_type: &str) -> DisplayHandle {
        let uri = format!("{URI_SCHEME}{}", Uuid::new_v4());
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                uri.clone(),
                DisplayEntry { mime_type: mime_type.to_string(), data },
            );
        }
        debug!(uri = %uri, "Display URI created");
        DisplayHandle { uri, registry: self.clone() }
    }

    /// Look up a live URI, returning its MIME type and bytes.
    pub fn resolve(&self, uri: &str) -> Option<(String, Bytes)> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(uri)
            .map(|entry| (entry.mime_type.clone(), entry.data.clone()))
    }

    /// Number of URIs currently alive.
    pub fn live_count(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    fn revoke(&self, uri: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            if entries.remove(uri).is_some() {
                debug!(uri = %uri, "Display URI revoked");
            }
        }
    }
}

/// Owner of one display URI; revokes it on drop.
#[derive(Debug)]
pub struct DisplayHandle {
    uri: String,
    registry: DisplayRegistry,
}

impl DisplayHandle {
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl Drop for DisplayHandle {
    fn drop(&mut self) {
        self.registry.revoke(&self.uri);
    }
}
