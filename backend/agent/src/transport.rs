//! Remote chat transport: one request, one assistant reply.

use async_trait::async_trait;
use reqwest::Client;
use scanchat_core::{ChatTurn, ScanResult};
use scanchat_understanding::openai::{
    self, post_chat_completion, ChatCompletionRequest, WireMessage,
};
use tracing::info;

pub const DEFAULT_CHAT_MAX_TOKENS: u32 = 1000;

/// Everything one outbound chat request carries.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Synthesized system turn (grounding context).
    pub system_text: String,
    /// Prior turns followed by the new user turn, in order.
    pub turns: Vec<ChatTurn>,
    /// Data URI attached to the last (user) turn, if any.
    pub image: Option<String>,
}

/// Trait for chat-completion backends used by [`crate::ChatSession`].
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Provider name (e.g. "OpenAI").
    fn name(&self) -> &str;

    /// Send the conversation and return the assistant text (may be empty).
    async fn complete(&self, api_key: &str, request: &ChatRequest) -> ScanResult<String>;
}

/// Lay out a request as chat-completions messages: system turn, then every
/// turn in order, with the image (if any) folded into the last turn.
pub fn build_messages(request: &ChatRequest) -> Vec<WireMessage> {
    let mut messages = Vec::with_capacity(request.turns.len() + 1);
    messages.push(WireMessage::text("system", request.system_text.as_str()));

    let last = request.turns.len().saturating_sub(1);
    for (idx, turn) in request.turns.iter().enumerate() {
        let message = match (&request.image, idx == last) {
            (Some(image), true) => WireMessage::with_image(turn.role.as_str(), turn.content.as_str(), image.as_str()),
            _ => WireMessage::text(turn.role.as_str(), turn.content.as_str()),
        };
        messages.push(message);
    }
    messages
}

/// OpenAI chat-completions transport.
#[derive(Debug, Clone)]
pub struct OpenAiChatTransport {
    client: Client,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiChatTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: openai::DEFAULT_BASE_URL.to_string(),
            model: openai::DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_CHAT_MAX_TOKENS,
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

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl ChatTransport for OpenAiChatTransport {
    fn name(&self) -> &str {
        openai::PROVIDER
    }

    async fn complete(&self, api_key: &str, request: &ChatRequest) -> ScanResult<String> {
        info!(
            model = %self.model,
            turns = request.turns.len(),
            with_image = request.image.is_some(),
            "Sending chat request"
        );
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: build_messages(request),
            max_tokens: self.max_tokens,
        };
        post_chat_completion(&self.client, &self.base_url, api_key, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(image: Option<&str>) -> ChatRequest {
        ChatRequest {
            system_text: "ground".into(),
            turns: vec![
                ChatTurn::user("first"),
                ChatTurn::assistant("reply"),
                ChatTurn::user("second"),
            ],
            image: image.map(str::to_string),
        }
    }

    #[test]
    fn system_turn_leads_and_order_is_kept() {
        let messages = build_messages(&request(None));
        let roles: Vec<_> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["system", "user", "assistant", "user"]);
        assert!(messages.iter().all(|m| !m.has_image()));
    }

    #[test]
    fn image_goes_on_last_turn_only() {
        let messages = build_messages(&request(Some("data:image/png;base64,AA==")));
        let flags: Vec<_> = messages.iter().map(WireMessage::has_image).collect();
        assert_eq!(flags, [false, false, false, true]);
    }

    #[tokio::test]
    async fn posts_chat_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "X"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = OpenAiChatTransport::new(Client::new()).with_base_url(server.uri());
        let reply = transport.complete("sk-test", &request(None)).await.unwrap();
        assert_eq!(reply, "X");

        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0], json!({"role": "system", "content": "ground"}));
    }
}
