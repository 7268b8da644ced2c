//! Wire types for `/chat/completions`.
//!
//! Only the fields every OpenAI-compatible gateway agrees on are modelled.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Request body, assembled with the `system`/`user` helpers.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
        }
    }

    pub fn system(self, content: impl Into<String>) -> Self {
        self.push(Role::System, content.into())
    }

    pub fn user(self, content: impl Into<String>) -> Self {
        self.push(Role::User, content.into())
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn push(mut self, role: Role, content: String) -> Self {
        self.messages.push(ChatMessage { role, content });
        self
    }
}

/// The first choice of a completion.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response body as sent. Refusals from some gateways carry `content: null`.
#[derive(Debug, Deserialize)]
pub(crate) struct CompletionBody {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl CompletionBody {
    /// `None` when there is no choice or the first one has no text.
    pub(crate) fn into_response(self) -> Option<ChatResponse> {
        let usage = self.usage;
        let choice = self.choices.into_iter().next()?;

        Some(ChatResponse {
            content: choice.message.content?,
            finish_reason: choice.finish_reason,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_lowercase_roles() {
        let request = ChatRequest::new("gpt-4o-mini")
            .system("You classify posts.")
            .user("hi");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_null_content_has_no_response() {
        let body: CompletionBody = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":null},"finish_reason":"content_filter"}]}"#,
        )
        .unwrap();

        assert!(body.into_response().is_none());
    }

    #[test]
    fn test_first_choice_wins() {
        let body: CompletionBody = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"a"},"finish_reason":"stop"},{"message":{"content":"b"}}],
                "usage":{"prompt_tokens":3}}"#,
        )
        .unwrap();

        let response = body.into_response().unwrap();
        assert_eq!(response.content, "a");
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
        assert_eq!(response.usage.unwrap().prompt_tokens, 3);
        assert_eq!(response.usage.unwrap().total_tokens, 0);
    }
}
