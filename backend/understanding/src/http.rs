//! Shared HTTP plumbing for remote providers.
//!
//! Every provider call goes through [`send_for_body`], so non-2xx handling and
//! error-message extraction behave the same for vision engines and chat.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use scanchat_core::{ScanError, ScanResult};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Build the HTTP client shared by all remote engines and the chat transport.
pub fn build_client(timeout: Duration) -> ScanResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ScanError::Config(format!("failed to build HTTP client: {e}")))
}

/// Generic message used when a provider gives no structured error.
pub fn generic_error_message(provider: &str) -> String {
    format!("{provider} API error")
}

/// Convert a non-2xx response into a transport error, preferring the
/// provider's own `error.message` field.
pub fn provider_error(provider: &str, status: StatusCode, body: &str) -> ScanError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|env| env.error)
        .and_then(|err| err.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| generic_error_message(provider));
    warn!(provider, status = %status, message = %message, "Provider returned an error");
    ScanError::transport(provider, message)
}

/// Send a prepared request and return the raw body of a 2xx response.
///
/// Network failures, including a body cut short after a 2xx status, and
/// non-2xx statuses become [`ScanError::Transport`].
/// The URL is stripped from network errors since some providers carry the
/// key in the query string.
pub async fn send_for_body(provider: &str, request: RequestBuilder) -> ScanResult<String> {
    let response = request.send().await.map_err(|e| {
        ScanError::transport(provider, format!("{provider} request failed: {}", e.without_url()))
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_else(|e| {
            debug!(provider, error = %e.without_url(), "Failed to read error body");
            String::new()
        });
        return Err(provider_error(provider, status, &body));
    }

    response.text().await.map_err(|e| {
        ScanError::transport(provider, format!("{provider} request failed: {}", e.without_url()))
    })
}
