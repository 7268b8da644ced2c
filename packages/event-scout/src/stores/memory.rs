//! In-memory storage implementation for testing and development.

use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;

use crate::domains::posts::{PostRecord, PostStore, ProcessedPost, RecordOutcome};
use crate::domains::subscribers::{Subscriber, SubscriberStore};

#[derive(Default)]
struct State {
    /// Insertion order
    posts: Vec<ProcessedPost>,
    /// Registration order
    subscribers: Vec<Subscriber>,
}

/// In-memory post ledger and subscriber registry.
///
/// Same uniqueness and ordering rules as the SQLite store; data is lost on
/// drop.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }

    /// Look up one ledger row.
    pub fn find_post(&self, source_id: &str, post_id: i64) -> Option<ProcessedPost> {
        self.state().ok().and_then(|state| {
            state
                .posts
                .iter()
                .find(|p| p.source_id == source_id && p.post_id == post_id)
                .cloned()
        })
    }

    pub fn post_count(&self) -> usize {
        self.state().map(|state| state.posts.len()).unwrap_or_default()
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn has_processed(&self, source_id: &str, post_id: i64) -> Result<bool> {
        Ok(self
            .state()?
            .posts
            .iter()
            .any(|p| p.source_id == source_id && p.post_id == post_id))
    }

    async fn record(&self, record: &PostRecord) -> Result<RecordOutcome> {
        let mut state = self.state()?;

        let exists = state
            .posts
            .iter()
            .any(|p| p.source_id == record.source_id && p.post_id == record.post_id);
        if exists {
            return Ok(RecordOutcome::AlreadyRecorded);
        }

        state.posts.push(ProcessedPost {
            source_id: record.source_id.clone(),
            post_id: record.post_id,
            post_timestamp: record.post_timestamp.clone(),
            raw_text: record.raw_text.clone(),
            is_event: record.is_event,
            extracted_fields: record.extracted_fields.clone(),
            processed_at: Utc::now(),
            delivered: false,
        });
        Ok(RecordOutcome::Inserted)
    }

    async fn mark_delivered(&self, source_id: &str, post_id: i64) -> Result<()> {
        let mut state = self.state()?;
        if let Some(post) = state
            .posts
            .iter_mut()
            .find(|p| p.source_id == source_id && p.post_id == post_id)
        {
            post.delivered = true;
        }
        Ok(())
    }

    async fn recent_events(&self, limit: usize) -> Result<Vec<ProcessedPost>> {
        let state = self.state()?;

        // Newest insertion first; the stable sort keeps that order for ties
        let mut events: Vec<ProcessedPost> = state
            .posts
            .iter()
            .rev()
            .filter(|p| p.is_event && p.delivered && p.extracted_fields.is_usable())
            .cloned()
            .collect();
        events.sort_by(|a, b| b.processed_at.cmp(&a.processed_at));
        events.truncate(limit);

        Ok(events)
    }
}

#[async_trait]
impl SubscriberStore for MemoryStore {
    async fn add_subscriber(&self, subscriber: &Subscriber) -> Result<()> {
        let mut state = self.state()?;

        match state
            .subscribers
            .iter_mut()
            .find(|s| s.chat_id == subscriber.chat_id)
        {
            Some(existing) => {
                if subscriber.username.is_some() {
                    existing.username = subscriber.username.clone();
                }
                if subscriber.first_name.is_some() {
                    existing.first_name = subscriber.first_name.clone();
                }
            }
            None => state.subscribers.push(subscriber.clone()),
        }
        Ok(())
    }

    async fn subscriber_chat_ids(&self) -> Result<Vec<i64>> {
        Ok(self.state()?.subscribers.iter().map(|s| s.chat_id).collect())
    }
}
