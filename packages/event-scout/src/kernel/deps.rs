//! Pipeline dependencies (using traits for testability)
//!
//! Every collaborator is constructed once at startup and passed in here;
//! nothing reaches for a global client.

use std::sync::Arc;

use crate::domains::channels::ChannelReader;
use crate::domains::detection::EventClassifier;
use crate::domains::notifications::NotificationDispatcher;
use crate::domains::posts::PostStore;
use crate::domains::subscribers::SubscriberStore;
use crate::kernel::BaseChatBot;

/// Dependencies shared by the polling worker and the bot service
#[derive(Clone)]
pub struct PipelineDeps {
    pub posts: Arc<dyn PostStore>,
    pub subscribers: Arc<dyn SubscriberStore>,
    pub classifier: Arc<dyn EventClassifier>,
    pub reader: Arc<dyn ChannelReader>,
    pub dispatcher: Arc<dyn NotificationDispatcher>,
    pub bot: Arc<dyn BaseChatBot>,
}
