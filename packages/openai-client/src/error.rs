//! Error types for the chat completion client.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OpenAIError>;

#[derive(Debug, Error)]
pub enum OpenAIError {
    /// HTTP client could not be built
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection failed before a response arrived
    #[error("Network error: {0}")]
    Network(String),

    /// The request exceeded the configured timeout
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Non-2xx response (auth failure, rate limit, invalid request)
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Response body was not the expected JSON shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Response parsed but carried no usable choice
    #[error("Empty response: no completion content returned")]
    EmptyResponse,
}
