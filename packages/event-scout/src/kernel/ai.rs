// AI implementation using the OpenAI-compatible chat completion client
//
// This is the infrastructure implementation of BaseAI.
// Business logic (what to prompt for) lives in domain layers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use openai_client::{ChatRequest, OpenAIClient};

use super::BaseAI;

/// Low temperature keeps the classifier's JSON output stable.
const COMPLETION_TEMPERATURE: f32 = 0.1;

/// OpenAI implementation of AI capabilities
#[derive(Clone)]
pub struct OpenAIAdapter {
    client: OpenAIClient,
    model: String,
}

impl OpenAIAdapter {
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl BaseAI for OpenAIAdapter {
    async fn complete(&self, prompt: &str) -> Result<String> {
        tracing::debug!(
            prompt_length = prompt.len(),
            model = %self.model,
            base_url = %self.client.base_url(),
            "Calling chat completion API"
        );

        let request = ChatRequest::new(self.model.as_str())
            .user(prompt)
            .with_temperature(COMPLETION_TEMPERATURE);

        let response = self
            .client
            .chat_completion(request)
            .await
            .context("Failed to call chat completion API")?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Chat completion usage"
            );
        }

        Ok(response.content)
    }
}

/// Stand-in used when no API key is configured; every call fails, so every
/// classification fails closed.
pub struct UnconfiguredAI;

#[async_trait]
impl BaseAI for UnconfiguredAI {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        anyhow::bail!("classifier API key is not configured")
    }
}
