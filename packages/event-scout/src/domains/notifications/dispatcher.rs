//! Outbound delivery of event notifications.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domains::subscribers::SubscriberStore;
use crate::kernel::BaseChatBot;

/// Counts for one `deliver` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub recipients: usize,
    pub delivered: usize,
    pub failed: usize,
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Send `text` to one chat, or to every subscriber when `recipient` is None.
    ///
    /// Per-recipient failures are counted in the report, not returned as errors.
    async fn deliver(&self, text: &str, recipient: Option<i64>) -> Result<DeliveryReport>;
}

/// Fans a message out to subscribers through the chat bot.
pub struct BroadcastDispatcher {
    bot: Arc<dyn BaseChatBot>,
    subscribers: Arc<dyn SubscriberStore>,
}

impl BroadcastDispatcher {
    pub fn new(bot: Arc<dyn BaseChatBot>, subscribers: Arc<dyn SubscriberStore>) -> Self {
        Self { bot, subscribers }
    }
}

#[async_trait]
impl NotificationDispatcher for BroadcastDispatcher {
    async fn deliver(&self, text: &str, recipient: Option<i64>) -> Result<DeliveryReport> {
        let chat_ids = match recipient {
            Some(chat_id) => vec![chat_id],
            None => self.subscribers.subscriber_chat_ids().await?,
        };

        let mut report = DeliveryReport {
            recipients: chat_ids.len(),
            ..Default::default()
        };

        if chat_ids.is_empty() {
            warn!("No subscribers to deliver to");
            return Ok(report);
        }

        // Sequential to stay under the Bot API per-bot rate limit
        for chat_id in chat_ids {
            match self.bot.send_message(chat_id, text, None).await {
                Ok(_) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(chat_id, error = %e, "Failed to deliver notification");
                }
            }
        }

        debug!(
            recipients = report.recipients,
            delivered = report.delivered,
            failed = report.failed,
            "Notification fan-out complete"
        );

        Ok(report)
    }
}
