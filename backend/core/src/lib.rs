pub mod chat;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod progress;

pub use chat::{ChatTurn, Role};
pub use credentials::{CredentialSlot, Credentials};
pub use engine::{EngineDescriptor, EngineId, ENGINES};
pub use error::{ScanError, ScanResult};
pub use progress::{ProgressSink, ProgressWatch};
