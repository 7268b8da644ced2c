// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (what to prompt for, what to say to a user) lives in domains.
//
// Naming convention: Base* for trait names (e.g., BaseAI, BaseChatBot)

use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// AI Trait (Infrastructure - Generic LLM capabilities)
// =============================================================================

#[async_trait]
pub trait BaseAI: Send + Sync {
    /// Complete a prompt with an LLM (returns raw text response)
    async fn complete(&self, prompt: &str) -> Result<String>;
}

// =============================================================================
// Chat Bot Trait (Infrastructure - outbound messages and inbound updates)
// =============================================================================

/// Inline button; each button is rendered on its own row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardButton {
    pub text: String,
    /// Opaque payload echoed back in the callback
    pub data: String,
}

impl KeyboardButton {
    pub fn new(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: data.into(),
        }
    }
}

/// Message a callback button was attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotEvent {
    /// Text message in a chat
    Message {
        chat_id: i64,
        text: String,
        username: Option<String>,
        first_name: Option<String>,
    },
    /// Inline button press
    Callback {
        callback_id: String,
        message: Option<MessageRef>,
        data: Option<String>,
    },
    /// Anything the bot does not react to
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotUpdate {
    pub update_id: i64,
    pub event: BotEvent,
}

#[async_trait]
pub trait BaseChatBot: Send + Sync {
    /// Send a message with link previews disabled; returns the message id.
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&[KeyboardButton]>,
    ) -> Result<i64>;

    async fn edit_message(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&[KeyboardButton]>,
    ) -> Result<()>;

    /// Acknowledge a button press so the client stops its spinner.
    async fn answer_callback(&self, callback_id: &str) -> Result<()>;

    /// Long-poll for updates with id >= `offset`.
    async fn poll_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<BotUpdate>>;
}
