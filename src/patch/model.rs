//! Model provider client.
//!
//! The generator talks to the model through `ModelClient`, so tests can script
//! responses. `AnthropicClient` is the production implementation over the
//! Messages API.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default model priority, most preferred first.
pub const DEFAULT_MODELS: &[&str] = &[
    "claude-sonnet-4-20250514",
    "claude-3-7-sonnet-20250219",
    "claude-3-5-haiku-20241022",
];

pub const DEFAULT_MAX_TOKENS: u32 = 8192;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// One completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
}

/// The text a model returned plus usage, when reported.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModelResponse {
    pub text: String,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

/// Errors from the model provider.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The provider does not recognise the requested model id.
    #[error("model {model} is unavailable: {message}")]
    ModelUnavailable { model: String, message: String },

    /// The provider answered with an error status.
    #[error("model API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The request did not complete within the configured timeout.
    #[error("model request timed out")]
    Timeout,

    /// The request never got a response.
    #[error("model transport error: {0}")]
    Transport(String),

    /// The response had no text content.
    #[error("model returned no text content")]
    EmptyResponse,
}

/// Sends prompts to a generative model.
pub trait ModelClient: Send + Sync {
    fn complete(
        &self,
        request: ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, ModelError>> + Send;
}

/// Client for the Anthropic Messages API.
#[derive(Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ModelError::Transport(e.to_string()))?;
        Ok(AnthropicClient {
            http,
            api_key: api_key.into(),
            base_url: base_url
                .unwrap_or_else(|| ANTHROPIC_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

impl ModelClient for AnthropicClient {
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            system: &request.system,
            messages: [Message {
                role: "user",
                content: &request.user,
            }],
        };

        debug!(model = %request.model, "Sending model request");
        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(transport_error)?;
        if !(200..300).contains(&status) {
            return Err(classify_error(status, &text, &request.model));
        }

        parse_response(&text)
    }
}

fn transport_error(err: reqwest::Error) -> ModelError {
    if err.is_timeout() {
        ModelError::Timeout
    } else {
        ModelError::Transport(err.to_string())
    }
}

/// Maps an error response to a `ModelError`.
///
/// A 404, or an error body of type `not_found_error`, means the model id was
/// not recognised. This is a pure function extracted for testability.
pub fn classify_error(status: u16, body: &str, model: &str) -> ModelError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = parsed
        .as_ref()
        .map(|envelope| envelope.error.message.clone())
        .unwrap_or_else(|| body.trim().to_string());
    let not_found = parsed
        .as_ref()
        .is_some_and(|envelope| envelope.error.kind == "not_found_error");

    if status == 404 || not_found {
        ModelError::ModelUnavailable {
            model: model.to_string(),
            message,
        }
    } else {
        ModelError::Api { status, message }
    }
}

fn parse_response(body: &str) -> Result<ModelResponse, ModelError> {
    let parsed: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| ModelError::Transport(format!("unreadable response body: {}", e)))?;

    let text: String = parsed
        .content
        .iter()
        .filter(|block| block.kind == "text")
        .map(|block| block.text.as_str())
        .collect();
    if text.trim().is_empty() {
        return Err(ModelError::EmptyResponse);
    }

    let (input_tokens, output_tokens) = parsed
        .usage
        .map(|u| (u.input_tokens, u.output_tokens))
        .unwrap_or((None, None));
    Ok(ModelResponse {
        text,
        input_tokens,
        output_tokens,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_is_unavailable() {
        let body = r#"{"type":"error","error":{"type":"not_found_error","message":"model: claude-nope"}}"#;
        match classify_error(404, body, "claude-nope") {
            ModelError::ModelUnavailable { model, message } => {
                assert_eq!(model, "claude-nope");
                assert_eq!(message, "model: claude-nope");
            }
            other => panic!("expected ModelUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn not_found_error_type_without_404_is_unavailable() {
        let body = r#"{"type":"error","error":{"type":"not_found_error","message":"model: x"}}"#;
        assert!(matches!(
            classify_error(400, body, "x"),
            ModelError::ModelUnavailable { .. }
        ));
    }

    #[test]
    fn other_errors_are_api_errors() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        assert!(matches!(
            classify_error(529, body, "m"),
            ModelError::Api { status: 529, ref message } if message == "Overloaded"
        ));
        assert!(matches!(
            classify_error(500, "<html>bad gateway</html>", "m"),
            ModelError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn text_blocks_and_usage_are_read() {
        let body = r#"{
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [
                {"type": "text", "text": "{\"a\":"},
                {"type": "text", "text": "1}"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 120, "output_tokens": 40}
        }"#;
        let response = parse_response(body).unwrap();
        assert_eq!(response.text, "{\"a\":1}");
        assert_eq!(response.input_tokens, Some(120));
        assert_eq!(response.output_tokens, Some(40));
    }

    #[test]
    fn empty_content_is_an_error() {
        let body = r#"{"content": [], "usage": null}"#;
        assert!(matches!(parse_response(body), Err(ModelError::EmptyResponse)));
    }

    #[test]
    fn request_body_shape() {
        let body = MessagesRequest {
            model: "m",
            max_tokens: 10,
            system: "sys",
            messages: [Message {
                role: "user",
                content: "hi",
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "model": "m",
                "max_tokens": 10,
                "system": "sys",
                "messages": [{"role": "user", "content": "hi"}]
            })
        );
    }
}
