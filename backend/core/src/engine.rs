//! Recognition engine identifiers and their display catalogue.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::credentials::{CredentialSlot, Credentials};

/// Closed set of recognition backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineId {
    /// Bundled offline pipeline (tesseract, German + English).
    #[default]
    Local,
    /// OpenAI chat-completions vision model.
    OpenAiVision,
    /// Gemini generateContent vision model.
    GeminiVision,
}

/// Display metadata plus the credential contract of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineDescriptor {
    pub id: EngineId,
    pub name: &'static str,
    pub description: &'static str,
    pub requires_credential: bool,
    pub credential_slot: Option<CredentialSlot>,
}

impl EngineDescriptor {
    /// Whether the slot this engine needs is filled. Engines without a
    /// credential are always ready.
    pub fn is_ready(&self, credentials: &Credentials) -> bool {
        self.credential_slot
            .map(|slot| credentials.has(slot))
            .unwrap_or(true)
    }
}

pub const ENGINES: [EngineDescriptor; 3] = [
    EngineDescriptor {
        id: EngineId::Local,
        name: "Tesseract",
        description: "Offline OCR (German + English), runs locally",
        requires_credential: false,
        credential_slot: None,
    },
    EngineDescriptor {
        id: EngineId::OpenAiVision,
        name: "GPT-4o Vision",
        description: "High accuracy, understands layout and handwriting",
        requires_credential: true,
        credential_slot: Some(CredentialSlot::OpenAi),
    },
    EngineDescriptor {
        id: EngineId::GeminiVision,
        name: "Gemini Vision",
        description: "Google multimodal model, fast and accurate",
        requires_credential: true,
        credential_slot: Some(CredentialSlot::Gemini),
    },
];

impl EngineId {
    pub fn descriptor(self) -> &'static EngineDescriptor {
        match self {
            EngineId::Local => &ENGINES[0],
            EngineId::OpenAiVision => &ENGINES[1],
            EngineId::GeminiVision => &ENGINES[2],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EngineId::Local => "local",
            EngineId::OpenAiVision => "open-ai-vision",
            EngineId::GeminiVision => "gemini-vision",
        }
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" | "tesseract" => Ok(EngineId::Local),
            "open-ai-vision" | "openai" | "gpt4-vision" => Ok(EngineId::OpenAiVision),
            "gemini-vision" | "gemini" => Ok(EngineId::GeminiVision),
            other => Err(format!("unknown engine: {other}")),
        }
    }
}
