//! The closed set of recognition engines and the registry that holds them.

use std::collections::HashMap;

use scanchat_core::{Credentials, EngineId, ProgressSink, ScanResult};
use scanchat_media::ImageArtifact;
use tracing::debug;

use crate::gemini::GeminiVision;
use crate::local::LocalEngine;
use crate::openai::OpenAiVision;

/// One recognition backend. Dispatch is by variant, so adding a backend
/// means touching every match on purpose.
#[derive(Debug, Clone)]
pub enum RecognitionEngine {
    Local(LocalEngine),
    OpenAiVision(OpenAiVision),
    GeminiVision(GeminiVision),
}

impl RecognitionEngine {
    pub fn id(&self) -> EngineId {
        match self {
            RecognitionEngine::Local(_) => EngineId::Local,
            RecognitionEngine::OpenAiVision(_) => EngineId::OpenAiVision,
            RecognitionEngine::GeminiVision(_) => EngineId::GeminiVision,
        }
    }

    /// Run one recognition against `artifact`.
    ///
    /// Credentialed engines check their slot before touching the network.
    pub async fn recognize(
        &self,
        artifact: &ImageArtifact,
        credentials: &Credentials,
        progress: &ProgressSink,
    ) -> ScanResult<String> {
        debug!(engine = %self.id(), "Dispatching recognition");
        match self {
            RecognitionEngine::Local(engine) => engine.recognize(artifact, progress).await,
            RecognitionEngine::OpenAiVision(engine) => {
                engine.recognize(artifact, credentials, progress).await
            }
            RecognitionEngine::GeminiVision(engine) => {
                engine.recognize(artifact, credentials, progress).await
            }
        }
    }
}

impl From<LocalEngine> for RecognitionEngine {
    fn from(engine: LocalEngine) -> Self {
        RecognitionEngine::Local(engine)
    }
}

impl From<OpenAiVision> for RecognitionEngine {
    fn from(engine: OpenAiVision) -> Self {
        RecognitionEngine::OpenAiVision(engine)
    }
}

impl From<GeminiVision> for RecognitionEngine {
    fn from(engine: GeminiVision) -> Self {
        RecognitionEngine::GeminiVision(engine)
    }
}

/// Registry of recognition engines, looked up by id.
#[derive(Debug, Clone, Default)]
pub struct EngineRegistry {
    engines: HashMap<EngineId, RecognitionEngine>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an engine under its own id, replacing any previous one.
    pub fn register(&mut self, engine: impl Into<RecognitionEngine>) {
        let engine = engine.into();
        self.engines.insert(engine.id(), engine);
    }

    pub fn with(mut self, engine: impl Into<RecognitionEngine>) -> Self {
        self.register(engine);
        self
    }

    pub fn get(&self, id: EngineId) -> Option<&RecognitionEngine> {
        self.engines.get(&id)
    }

    /// Registered ids, in catalogue order.
    pub fn ids(&self) -> Vec<EngineId> {
        scanchat_core::ENGINES
            .iter()
            .map(|d| d.id)
            .filter(|id| self.engines.contains_key(id))
            .collect()
    }
}
