//! Semantic event classifier backed by a chat-completion model.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use super::prompts::{build_prompt, EVENT_DETECTION_PROMPT};
use super::response::parse_classifier_response;
use crate::domains::posts::ExtractedFields;
use crate::kernel::BaseAI;

/// Verdict for one post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub is_event: bool,
    pub fields: ExtractedFields,
}

impl Classification {
    /// The fail-closed result: not an event, no fields.
    pub fn non_event() -> Self {
        Self::default()
    }
}

#[derive(Debug, Error)]
pub enum ClassificationError {
    /// Transport, auth, timeout or empty completion
    #[error("classifier service error: {0}")]
    Service(String),

    #[error("malformed classifier response: {reason}")]
    MalformedResponse { reason: String, raw: String },
}

#[async_trait]
pub trait EventClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification, ClassificationError>;
}

pub struct LlmEventClassifier {
    ai: Arc<dyn BaseAI>,
    prompt_template: String,
}

impl LlmEventClassifier {
    pub fn new(ai: Arc<dyn BaseAI>) -> Self {
        Self {
            ai,
            prompt_template: EVENT_DETECTION_PROMPT.to_string(),
        }
    }

    pub fn with_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = template.into();
        self
    }
}

#[async_trait]
impl EventClassifier for LlmEventClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, ClassificationError> {
        let prompt = build_prompt(&self.prompt_template, text);

        let raw = self
            .ai
            .complete(&prompt)
            .await
            .map_err(|e| ClassificationError::Service(format!("{:#}", e)))?;

        debug!(response_length = raw.len(), "Classifier response received");

        parse_classifier_response(&raw)
    }
}
