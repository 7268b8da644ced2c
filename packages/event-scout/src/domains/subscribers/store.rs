use anyhow::Result;
use async_trait::async_trait;

use super::models::Subscriber;

/// Registry of broadcast recipients, shared between the bot and the dispatcher.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Register or refresh a subscriber; one row per chat.
    async fn add_subscriber(&self, subscriber: &Subscriber) -> Result<()>;

    /// Chat ids of every current subscriber, oldest registration first.
    async fn subscriber_chat_ids(&self) -> Result<Vec<i64>>;
}
