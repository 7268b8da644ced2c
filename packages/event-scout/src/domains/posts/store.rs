use anyhow::Result;
use async_trait::async_trait;

use super::models::{PostRecord, ProcessedPost, RecordOutcome};

/// Durable idempotency ledger keyed by (source_id, post_id).
///
/// Implementations must enforce uniqueness of the key themselves so that
/// concurrent writers cannot produce a second row for the same post.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn has_processed(&self, source_id: &str, post_id: i64) -> Result<bool>;

    /// Insert the record unless the key already exists. Never overwrites.
    async fn record(&self, record: &PostRecord) -> Result<RecordOutcome>;

    /// Flip `delivered` to true. No-op if already delivered or unknown.
    async fn mark_delivered(&self, source_id: &str, post_id: i64) -> Result<()>;

    /// Delivered events with usable fields, most recently processed first.
    async fn recent_events(&self, limit: usize) -> Result<Vec<ProcessedPost>>;
}
