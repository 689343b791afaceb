//! Text recognition for ScanChat.
//!
//! Three interchangeable engines behind one contract: a local tesseract
//! pipeline and two remote vision models (OpenAI, Gemini).

pub mod engine;
pub mod gemini;
pub mod http;
pub mod local;
pub mod openai;

pub use engine::{EngineRegistry, RecognitionEngine};
pub use gemini::GeminiVision;
pub use http::{build_client, provider_error, send_for_body};
pub use local::{LocalEngine, LocalOcrBackend, TesseractCli};
pub use openai::OpenAiVision;

/// Fixed instruction sent to remote vision models.
pub const OCR_INSTRUCTION: &str = "Extract all visible text from this image. \
Preserve the original layout and line breaks as closely as possible. \
Return only the extracted text, without any commentary or explanation.";

/// Synthetic progress set right before a remote request is sent.
pub const PROGRESS_BEFORE_REQUEST: u8 = 30;

/// Synthetic progress set as soon as a remote response arrives.
pub const PROGRESS_AFTER_RESPONSE: u8 = 90;
