//! Session Event Logger
//!
//! OCR and chat lifecycle events, redacted and emitted on a dedicated target
//! so the NDJSON file can be filtered for them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::redact::redact_sensitive_data;

pub const EVENT_TARGET: &str = "session_events";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    OcrStarted {
        engine: String,
        job_id: Uuid,
    },
    OcrFinished {
        engine: String,
        job_id: Uuid,
        outcome: String,
    },
    ChatTurn {
        role: String,
        content: String,
    },
    Error {
        error_msg: String,
    },
}

impl SessionEvent {
    pub fn ocr_started(engine: impl Into<String>, job_id: Uuid) -> Self {
        Self::OcrStarted { engine: engine.into(), job_id }
    }

    pub fn ocr_finished(engine: impl Into<String>, job_id: Uuid, outcome: impl Into<String>) -> Self {
        Self::OcrFinished {
            engine: engine.into(),
            job_id,
            outcome: outcome.into(),
        }
    }

    pub fn chat_turn(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ChatTurn {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn error(error_msg: impl Into<String>) -> Self {
        Self::Error { error_msg: error_msg.into() }
    }

    fn redacted(mut self) -> Self {
        match &mut self {
            SessionEvent::OcrFinished { outcome, .. } => *outcome = redact_sensitive_data(outcome),
            SessionEvent::ChatTurn { content, .. } => *content = redact_sensitive_data(content),
            SessionEvent::Error { error_msg } => *error_msg = redact_sensitive_data(error_msg),
            SessionEvent::OcrStarted { .. } => {}
        }
        self
    }
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: SessionEvent,
}

impl EventLogEntry {
    pub fn new(session_id: &str, event: SessionEvent) -> Self {
        Self {
            session_id: session_id.into(),
            timestamp: Utc::now(),
            event: event.redacted(),
        }
    }
}

pub struct EventLogger;

impl EventLogger {
    /// Redact and emit one event.
    pub fn log_event(session_id: &str, event: SessionEvent) {
        let entry = EventLogEntry::new(session_id, event);
        match serde_json::to_string(&entry) {
            Ok(json) => info!(target: EVENT_TARGET, event = %json, "Session event"),
            Err(_) => info!(target: EVENT_TARGET, event = ?entry, "Session event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_content_is_redacted() {
        let entry = EventLogEntry::new(
            "s1",
            SessionEvent::chat_turn("user", "my key is sk-abcdefghijklmnop0123"),
        );
        assert_eq!(
            entry.event,
            SessionEvent::chat_turn("user", "my key is [REDACTED_TOKEN]")
        );
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let id = Uuid::nil();
        let value = serde_json::to_value(SessionEvent::ocr_started("local", id)).unwrap();
        assert_eq!(value["type"], "OcrStarted");
        assert_eq!(value["engine"], "local");

        let entry = EventLogEntry::new("s2", SessionEvent::error("Gemini API error"));
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["session_id"], "s2");
        assert_eq!(value["event"]["error_msg"], "Gemini API error");
    }

    #[test]
    fn log_event_without_subscriber_is_silent() {
        EventLogger::log_event("s3", SessionEvent::ocr_finished("gemini-vision", Uuid::nil(), "succeeded"));
    }
}
