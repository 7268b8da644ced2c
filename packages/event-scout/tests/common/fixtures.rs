//! Test fixtures for channel posts and ledger rows.

use chrono::{Duration, Utc};
use scout_core::domains::channels::ChannelPost;
use scout_core::domains::posts::{ExtractedFields, PostRecord, PostStore};

pub const CHANNEL: &str = "rustmeetups";

/// RFC 3339 timestamp `hours` before now
pub fn hours_ago(hours: i64) -> String {
    (Utc::now() - Duration::hours(hours)).to_rfc3339()
}

/// A post published an hour ago
pub fn fresh_post(id: i64, text: &str) -> ChannelPost {
    ChannelPost::new(id, text, hours_ago(1))
}

/// A post published well outside the default horizon
pub fn stale_post(id: i64, text: &str) -> ChannelPost {
    ChannelPost::new(id, text, hours_ago(24 * 30))
}

/// Classifier reply announcing an event with the given fields
pub fn event_reply(fields: serde_json::Value) -> String {
    let mut reply = serde_json::json!({"is_event": true});
    if let (Some(reply), Some(fields)) = (reply.as_object_mut(), fields.as_object()) {
        reply.extend(fields.clone());
    }
    reply.to_string()
}

/// Insert an already-delivered event straight into the ledger
pub async fn seed_delivered_event(store: &dyn PostStore, post_id: i64, title: &str) {
    let fields = ExtractedFields {
        title: Some(title.to_string()),
        place: Some("Loft Hall".to_string()),
        ..Default::default()
    };
    let post = fresh_post(post_id, title);
    store
        .record(&PostRecord::new(CHANNEL, &post, true, fields))
        .await
        .unwrap();
    store.mark_delivered(CHANNEL, post_id).await.unwrap();
}
