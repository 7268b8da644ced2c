// TestDependencies - mock implementations for testing
//
// Provides mock collaborators that can be assembled into PipelineDeps for
// tests. The stores are real (MemoryStore or in-memory SQLite).

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use super::{BaseAI, BaseChatBot, BotUpdate, KeyboardButton, MessageRef, PipelineDeps};
use crate::domains::channels::{ChannelPost, ChannelReader};
use crate::domains::detection::LlmEventClassifier;
use crate::domains::notifications::BroadcastDispatcher;
use crate::domains::posts::PostStore;
use crate::domains::subscribers::SubscriberStore;
use crate::stores::MemoryStore;

// =============================================================================
// Mock AI (Generic LLM capabilities)
// =============================================================================

pub struct MockAI {
    responses: Arc<Mutex<Vec<std::result::Result<String, String>>>>,
    default_response: String,
    calls: Arc<Mutex<Vec<String>>>,
}

impl Default for MockAI {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAI {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            default_response: r#"{"is_event": false}"#.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a text response to the queue
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push(Ok(response.into()));
        self
    }

    /// Add a failed call to the queue
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push(Err(message.into()));
        self
    }

    /// Response used once the queue is empty
    pub fn with_default_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = response.into();
        self
    }

    /// Get all prompts that were sent to the AI
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Get the number of times the AI was called
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl BaseAI for MockAI {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.lock().unwrap().push(prompt.to_string());

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(self.default_response.clone());
        }
        responses.remove(0).map_err(anyhow::Error::msg)
    }
}

// =============================================================================
// Mock Channel Reader
// =============================================================================

#[derive(Default)]
pub struct MockChannelReader {
    posts: Arc<Mutex<HashMap<String, Vec<ChannelPost>>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockChannelReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Posts returned for `channel`, in the given order
    pub fn with_posts(self, channel: &str, posts: Vec<ChannelPost>) -> Self {
        self.posts
            .lock()
            .unwrap()
            .entry(channel.to_string())
            .or_default()
            .extend(posts);
        self
    }

    /// Make every fetch of `channel` fail
    pub fn failing_for(self, channel: &str) -> Self {
        self.failing.lock().unwrap().insert(channel.to_string());
        self
    }

    /// Channels fetched, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelReader for MockChannelReader {
    async fn fetch_new_posts(&self, channel: &str, limit: usize) -> Result<Vec<ChannelPost>> {
        self.calls.lock().unwrap().push(channel.to_string());

        if self.failing.lock().unwrap().contains(channel) {
            anyhow::bail!("mock fetch failure for {}", channel);
        }

        Ok(self
            .posts
            .lock()
            .unwrap()
            .get(channel)
            .map(|posts| posts.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

// =============================================================================
// Mock Chat Bot
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Option<Vec<KeyboardButton>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedMessage {
    pub message: MessageRef,
    pub text: String,
    pub keyboard: Option<Vec<KeyboardButton>>,
}

#[derive(Default)]
pub struct MockChatBot {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    edited: Arc<Mutex<Vec<EditedMessage>>>,
    answered: Arc<Mutex<Vec<String>>>,
    updates: Arc<Mutex<Vec<Vec<BotUpdate>>>>,
    offsets: Arc<Mutex<Vec<Option<i64>>>>,
    failing_chats: Arc<Mutex<HashSet<i64>>>,
}

impl MockChatBot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one batch of updates for the next poll
    pub fn with_updates(self, batch: Vec<BotUpdate>) -> Self {
        self.updates.lock().unwrap().push(batch);
        self
    }

    /// Make every send to `chat_id` fail
    pub fn failing_for(self, chat_id: i64) -> Self {
        self.failing_chats.lock().unwrap().insert(chat_id);
        self
    }

    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn edited_messages(&self) -> Vec<EditedMessage> {
        self.edited.lock().unwrap().clone()
    }

    pub fn answered_callbacks(&self) -> Vec<String> {
        self.answered.lock().unwrap().clone()
    }

    /// Offsets passed to each poll, in call order
    pub fn poll_offsets(&self) -> Vec<Option<i64>> {
        self.offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseChatBot for MockChatBot {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&[KeyboardButton]>,
    ) -> Result<i64> {
        if self.failing_chats.lock().unwrap().contains(&chat_id) {
            anyhow::bail!("mock send failure for chat {}", chat_id);
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push(SentMessage {
            chat_id,
            text: text.to_string(),
            keyboard: keyboard.map(<[KeyboardButton]>::to_vec),
        });
        Ok(sent.len() as i64)
    }

    async fn edit_message(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&[KeyboardButton]>,
    ) -> Result<()> {
        self.edited.lock().unwrap().push(EditedMessage {
            message,
            text: text.to_string(),
            keyboard: keyboard.map(<[KeyboardButton]>::to_vec),
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        self.answered.lock().unwrap().push(callback_id.to_string());
        Ok(())
    }

    async fn poll_updates(&self, offset: Option<i64>, _timeout_secs: u64) -> Result<Vec<BotUpdate>> {
        self.offsets.lock().unwrap().push(offset);

        let next = {
            let mut updates = self.updates.lock().unwrap();
            (!updates.is_empty()).then(|| updates.remove(0))
        };
        match next {
            Some(batch) => Ok(batch),
            None => {
                // Behave like an idle long poll so callers do not spin
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                Ok(Vec::new())
            }
        }
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

pub struct TestDependencies {
    pub ai: Arc<MockAI>,
    pub reader: Arc<MockChannelReader>,
    pub bot: Arc<MockChatBot>,
    pub store: Arc<MemoryStore>,
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            ai: Arc::new(MockAI::new()),
            reader: Arc::new(MockChannelReader::new()),
            bot: Arc::new(MockChatBot::new()),
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// Set a mock AI
    pub fn mock_ai(mut self, ai: MockAI) -> Self {
        self.ai = Arc::new(ai);
        self
    }

    /// Set a mock channel reader
    pub fn mock_reader(mut self, reader: MockChannelReader) -> Self {
        self.reader = Arc::new(reader);
        self
    }

    /// Set a mock chat bot
    pub fn mock_bot(mut self, bot: MockChatBot) -> Self {
        self.bot = Arc::new(bot);
        self
    }

    /// Assemble PipelineDeps backed by the in-memory store
    pub fn build_deps(&self) -> PipelineDeps {
        self.deps_with_store(self.store.clone(), self.store.clone())
    }

    /// Assemble PipelineDeps backed by the given stores
    pub fn deps_with_store(
        &self,
        posts: Arc<dyn PostStore>,
        subscribers: Arc<dyn SubscriberStore>,
    ) -> PipelineDeps {
        let bot: Arc<dyn BaseChatBot> = self.bot.clone();
        PipelineDeps {
            posts,
            subscribers: subscribers.clone(),
            classifier: Arc::new(LlmEventClassifier::new(self.ai.clone())),
            reader: self.reader.clone(),
            dispatcher: Arc::new(BroadcastDispatcher::new(bot.clone(), subscribers)),
            bot,
        }
    }
}
