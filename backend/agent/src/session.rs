//! Chat session grounded in one image and its extracted text.
//!
//! Rules:
//! - the user turn is appended before the request goes out and is never
//!   rolled back;
//! - the image rides along with the first user turn of the session only;
//! - at most one request is outstanding; a second caller gets
//!   [`ScanError::SessionBusy`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use scanchat_core::{ChatTurn, CredentialSlot, Credentials, ScanError, ScanResult};
use scanchat_logging::{EventLogger, SessionEvent};
use scanchat_media::ImageArtifact;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::system_prompt::GroundingPrompt;
use crate::transport::{ChatRequest, ChatTransport};

/// Assistant content recorded when the provider answers with nothing.
pub const NO_ANSWER_SENTINEL: &str = "No answer received.";

#[derive(Debug, Default)]
struct SessionState {
    turns: Vec<ChatTurn>,
    grounding_text: String,
    image: Option<Arc<ImageArtifact>>,
}

/// Ordered conversation state plus the image-injection and grounding rules.
pub struct ChatSession {
    id: Uuid,
    transport: Arc<dyn ChatTransport>,
    state: RwLock<SessionState>,
    in_flight: AtomicBool,
    generation: AtomicU64,
}

/// Clears the in-flight flag however the request ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ChatSession {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self::from_state(transport, SessionState::default())
    }

    /// Session bound to an image whose data URI goes out with the first turn.
    pub fn with_image(transport: Arc<dyn ChatTransport>, image: Arc<ImageArtifact>) -> Self {
        Self::from_state(
            transport,
            SessionState { image: Some(image), ..Default::default() },
        )
    }

    fn from_state(transport: Arc<dyn ChatTransport>, state: SessionState) -> Self {
        Self {
            id: Uuid::new_v4(),
            transport,
            state: RwLock::new(state),
            in_flight: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn turns(&self) -> Vec<ChatTurn> {
        self.state.read().await.turns.clone()
    }

    pub async fn grounding_text(&self) -> String {
        self.state.read().await.grounding_text.clone()
    }

    /// Replace the grounding text. Only requests sent after this see it.
    pub async fn set_grounding_text(&self, text: impl Into<String>) {
        self.state.write().await.grounding_text = text.into();
    }

    /// Set the image offered to the first turn. Has no effect once the first
    /// turn has been sent.
    pub async fn set_image(&self, image: Option<Arc<ImageArtifact>>) {
        self.state.write().await.image = image;
    }

    /// Drop every turn and the image. A reply still in flight is discarded.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        state.turns.clear();
        state.image = None;
        debug!(session_id = %self.id, "Chat session reset");
    }

    /// Append a user turn, send the conversation, and append the reply.
    ///
    /// On transport failure the user turn stays as the last entry and the
    /// error is returned for display.
    #[instrument(skip(self, text, credentials), fields(session_id = %self.id))]
    pub async fn append_user_turn(&self, text: &str, credentials: &Credentials) -> ScanResult<ChatTurn> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ScanError::InvalidInput("message is empty".into()));
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ScanError::SessionBusy);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let api_key = credentials
            .get(CredentialSlot::OpenAi)
            .ok_or(ScanError::CredentialMissing { slot: CredentialSlot::OpenAi })?;

        let (request, generation) = {
            let mut state = self.state.write().await;
            let first_turn = state.turns.is_empty();
            let image = match (&state.image, first_turn) {
                (Some(artifact), true) => Some(artifact.data_uri().to_string()),
                _ => None,
            };
            state.turns.push(ChatTurn::user(text));
            let request = ChatRequest {
                system_text: GroundingPrompt::build(&state.grounding_text),
                turns: state.turns.clone(),
                image,
            };
            (request, self.generation.load(Ordering::Acquire))
        };
        EventLogger::log_event(&self.id.to_string(), SessionEvent::chat_turn("user", text));

        let reply = match self.transport.complete(api_key, &request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(provider = self.transport.name(), error = %e, "Chat request failed");
                EventLogger::log_event(&self.id.to_string(), SessionEvent::error(e.to_string()));
                return Err(e);
            }
        };

        let content = if reply.trim().is_empty() {
            NO_ANSWER_SENTINEL.to_string()
        } else {
            reply
        };
        let assistant = ChatTurn::assistant(content);

        let mut state = self.state.write().await;
        if self.generation.load(Ordering::Acquire) != generation {
            debug!("Session reset during request; reply dropped");
            return Err(ScanError::Superseded);
        }
        state.turns.push(assistant.clone());
        drop(state);

        EventLogger::log_event(
            &self.id.to_string(),
            SessionEvent::chat_turn("assistant", &assistant.content),
        );
        Ok(assistant)
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("transport", &self.transport.name())
            .field("busy", &self.is_busy())
            .finish()
    }
}
