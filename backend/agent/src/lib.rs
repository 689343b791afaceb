//! ScanChat Agent
//!
//! OCR job orchestration, the grounded chat session and the workbench that
//! ties an image, the selected engine and the conversation together.

pub mod job;
pub mod session;
pub mod system_prompt;
pub mod transport;
pub mod workbench;

pub use job::{JobSnapshot, JobState, JobTracker, JobWatch, OcrJob, GENERIC_FAILURE, NO_TEXT_SENTINEL};
pub use session::{ChatSession, NO_ANSWER_SENTINEL};
pub use system_prompt::GroundingPrompt;
pub use transport::{ChatRequest, ChatTransport, OpenAiChatTransport, DEFAULT_CHAT_MAX_TOKENS};
pub use workbench::{EngineListing, Workbench, KEY_MISSING_SUFFIX};
