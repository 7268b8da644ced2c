use serde::{Deserialize, Serialize};

/// A post as observed in a channel, before any processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelPost {
    pub id: i64,
    pub text: String,
    /// Publication time as reported by the source (RFC 3339 when well-formed)
    pub timestamp: String,
}

impl ChannelPost {
    pub fn new(id: i64, text: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// Public permalink of a channel post.
pub fn source_link(channel: &str, post_id: i64) -> String {
    format!("https://t.me/{}/{}", channel, post_id)
}
