//! Telemetry and structured logging for ScanChat.
//!
//! Handles credential redaction, NDJSON file rotation and OCR/chat lifecycle
//! event logging.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogEntry, EventLogger, SessionEvent, EVENT_TARGET};
pub use logger::{init_logger, LoggerGuard, LOG_FILE_PREFIX};
pub use redact::redact_sensitive_data;
