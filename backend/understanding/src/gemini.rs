//! Gemini generateContent wire format and the vision recognition engine.

use reqwest::Client;
use scanchat_core::{CredentialSlot, Credentials, ProgressSink, ScanError, ScanResult};
use scanchat_media::{split_data_uri, ImageArtifact};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::http::send_for_body;
use crate::{OCR_INSTRUCTION, PROGRESS_AFTER_RESPONSE, PROGRESS_BEFORE_REQUEST};

pub const PROVIDER: &str = "Gemini";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Text of the first candidate's first part; `""` for any other shape.
pub fn first_candidate_text(body: &str) -> String {
    serde_json::from_str::<GenerateResponse>(body)
        .ok()
        .and_then(|resp| resp.candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .unwrap_or_default()
}

/// Remote vision engine B: Gemini with the image as inline data.
#[derive(Debug, Clone)]
pub struct GeminiVision {
    client: Client,
    base_url: String,
    model: String,
}

impl GeminiVision {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub async fn recognize(
        &self,
        artifact: &ImageArtifact,
        credentials: &Credentials,
        progress: &ProgressSink,
    ) -> ScanResult<String> {
        let api_key = credentials
            .get(CredentialSlot::Gemini)
            .ok_or(ScanError::CredentialMissing { slot: CredentialSlot::Gemini })?;

        // Gemini wants the bare payload, with the MIME type taken from the data URI prefix.
        let (mime_type, data) = split_data_uri(artifact.data_uri())
            .ok_or_else(|| ScanError::InvalidInput("image has no base64 data URI".into()))?;

        info!(model = %self.model, artifact_id = %artifact.id(), "[Vision] Extracting text via Gemini");
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    RequestPart::Text { text: OCR_INSTRUCTION.to_string() },
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type.to_string(),
                            data: data.to_string(),
                        },
                    },
                ],
            }],
        };
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        debug!(url = %url, "Sending request to Gemini");

        progress.report(PROGRESS_BEFORE_REQUEST);
        let response = send_for_body(
            PROVIDER,
            self.client.post(&url).query(&[("key", api_key)]).json(&body),
        )
        .await?;
        progress.report(PROGRESS_AFTER_RESPONSE);
        Ok(first_candidate_text(&response))
    }
}
