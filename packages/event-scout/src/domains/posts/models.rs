use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domains::channels::{source_link, ChannelPost};

/// Structured event details pulled out of a post by the classifier.
///
/// Each field is independently optional. Blank strings are treated the same
/// as missing ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedFields {
    pub title: Option<String>,
    pub date: Option<String>,
    pub place: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
}

impl ExtractedFields {
    /// At least one of the five fields carries non-whitespace content.
    ///
    /// Gates delivery even when the classifier said "event", which keeps
    /// digest-style posts with nothing actionable out of the broadcast.
    pub fn is_usable(&self) -> bool {
        [
            &self.title,
            &self.date,
            &self.place,
            &self.link,
            &self.description,
        ]
        .into_iter()
        .any(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }

    /// Trim every field and drop the ones that end up empty.
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            title: clean(self.title),
            date: clean(self.date),
            place: clean(self.place),
            link: clean(self.link),
            description: clean(self.description),
        }
    }
}

/// Row of the idempotency ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedPost {
    pub source_id: String,
    pub post_id: i64,
    pub post_timestamp: String,
    pub raw_text: String,
    pub is_event: bool,
    pub extracted_fields: ExtractedFields,
    pub processed_at: DateTime<Utc>,
    pub delivered: bool,
}

impl ProcessedPost {
    pub fn source_link(&self) -> String {
        source_link(&self.source_id, self.post_id)
    }
}

/// Everything `PostStore::record` writes for one post.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub source_id: String,
    pub post_id: i64,
    pub post_timestamp: String,
    pub raw_text: String,
    pub is_event: bool,
    pub extracted_fields: ExtractedFields,
}

impl PostRecord {
    /// Tombstone for a post that never reached (or failed) classification.
    pub fn non_event(source_id: &str, post: &ChannelPost) -> Self {
        Self::new(source_id, post, false, ExtractedFields::default())
    }

    pub fn new(
        source_id: &str,
        post: &ChannelPost,
        is_event: bool,
        extracted_fields: ExtractedFields,
    ) -> Self {
        Self {
            source_id: source_id.to_string(),
            post_id: post.id,
            post_timestamp: post.timestamp.clone(),
            raw_text: post.text.clone(),
            is_event,
            extracted_fields,
        }
    }
}

/// Result of an idempotent insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Inserted,
    /// The pair was already in the ledger; nothing was written.
    AlreadyRecorded,
}
