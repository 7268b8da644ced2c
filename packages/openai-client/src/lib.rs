//! Chat completion client for OpenAI-compatible gateways.
//!
//! Talks to `{base_url}/chat/completions` and hands back the first choice.
//! Domain prompts and response parsing belong to the caller.
//!
//! ```rust,ignore
//! use openai_client::{ChatRequest, OpenAIClient};
//!
//! let client = OpenAIClient::new(api_key)
//!     .with_base_url("https://gateway.example.com/v1")
//!     .with_timeout(Duration::from_secs(60))?;
//! let reply = client
//!     .chat_completion(ChatRequest::new("gpt-4o-mini").user("Hello!"))
//!     .await?;
//! ```

pub mod error;
pub mod types;

pub use error::{OpenAIError, Result};
pub use types::{ChatMessage, ChatRequest, ChatResponse, Role, Usage};

use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::{debug, warn};

use crate::types::CompletionBody;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Clone)]
pub struct OpenAIClient {
    http: Client,
    api_key: String,
    base_url: String,
    timeout: Option<Duration>,
}

impl OpenAIClient {
    /// Client for the public OpenAI endpoint with no request timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound every request, connect through last byte, by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OpenAIError::Config(format!("cannot build HTTP client: {}", e)))?;
        self.timeout = Some(timeout);
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let started = Instant::now();

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, model = %request.model, "Chat completion rejected");
            return Err(OpenAIError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: CompletionBody = response
            .json()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))?;
        let reply = body.into_response().ok_or(OpenAIError::EmptyResponse)?;

        debug!(
            model = %request.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            finish_reason = ?reply.finish_reason,
            "Chat completion received"
        );

        Ok(reply)
    }

    fn transport_error(&self, e: reqwest::Error) -> OpenAIError {
        warn!(error = %e, base_url = %self.base_url, "Chat completion request failed");
        match self.timeout {
            Some(timeout) if e.is_timeout() => OpenAIError::Timeout(timeout.as_secs()),
            _ => OpenAIError::Network(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OpenAIClient {
        OpenAIClient::new("sk-test").with_base_url(server.uri())
    }

    #[test]
    fn test_base_url_loses_trailing_slash() {
        let client = OpenAIClient::new("sk-test").with_base_url("https://gateway.example.com/v1/");
        assert_eq!(client.base_url(), "https://gateway.example.com/v1");
    }

    #[tokio::test]
    async fn test_reply_is_first_choice_with_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": {"role": "assistant", "content": "{\"is_event\": false}"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client(&server)
            .chat_completion(ChatRequest::new("test-model").user("hi"))
            .await
            .unwrap();

        assert_eq!(reply.content, "{\"is_event\": false}");
        assert_eq!(reply.usage.map(|u| u.total_tokens), Some(15));
    }

    #[tokio::test]
    async fn test_rejection_keeps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let err = client(&server)
            .chat_completion(ChatRequest::new("test-model").user("hi"))
            .await
            .unwrap_err();

        match err {
            OpenAIError::Api { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid key");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_choices_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client(&server)
            .chat_completion(ChatRequest::new("test-model"))
            .await
            .unwrap_err();

        assert!(matches!(err, OpenAIError::EmptyResponse));
    }
}
