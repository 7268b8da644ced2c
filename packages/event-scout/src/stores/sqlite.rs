//! SQLite storage implementation.
//!
//! Schema lives in `migrations/` and is applied on connect. Uniqueness of
//! `(channel_username, post_id)` is enforced by the table itself, so two
//! writers racing on the same post produce one row.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::TryStreamExt;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;

use crate::domains::posts::{ExtractedFields, PostRecord, PostStore, ProcessedPost, RecordOutcome};
use crate::domains::subscribers::{Subscriber, SubscriberStore};

/// SQLite-backed post ledger and subscriber registry.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect and apply migrations.
    ///
    /// # Example URLs
    /// - `sqlite://database.db?mode=rwc` - File-based, created if missing
    /// - `sqlite::memory:` - Ephemeral; prefer [`SqliteStore::in_memory`]
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .with_context(|| format!("Failed to open database {}", database_url))?;

        Self::from_pool(pool).await
    }

    /// In-memory database on a single long-lived connection (for testing).
    ///
    /// Every SQLite in-memory connection is its own database, so the pool
    /// must never open a second one or drop the first.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;

        Ok(Self { pool })
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Look up one ledger row.
    pub async fn find_post(&self, source_id: &str, post_id: i64) -> Result<Option<ProcessedPost>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {} FROM processed_posts WHERE channel_username = ? AND post_id = ?",
            POST_COLUMNS
        ))
        .bind(source_id)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load processed post")?;

        row.map(PostRow::into_processed_post).transpose()
    }

    pub async fn post_count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM processed_posts")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count processed posts")?;
        Ok(count)
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    // Fixed width so lexicographic order matches chronological order
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

const POST_COLUMNS: &str = "channel_username, post_id, post_date, post_text, is_event, \
                            extracted_data, processed_at, sent_to_bot";

// Row types for sqlx queries
#[derive(Debug, FromRow)]
struct PostRow {
    channel_username: String,
    post_id: i64,
    post_date: String,
    post_text: Option<String>,
    is_event: bool,
    extracted_data: String,
    processed_at: String,
    sent_to_bot: bool,
}

impl PostRow {
    fn into_processed_post(self) -> Result<ProcessedPost> {
        let processed_at = DateTime::parse_from_rfc3339(&self.processed_at)
            .with_context(|| format!("Invalid processed_at: {}", self.processed_at))?
            .with_timezone(&Utc);

        let extracted_fields: ExtractedFields = serde_json::from_str(&self.extracted_data)
            .context("Invalid extracted_data JSON")?;

        Ok(ProcessedPost {
            source_id: self.channel_username,
            post_id: self.post_id,
            post_timestamp: self.post_date,
            raw_text: self.post_text.unwrap_or_default(),
            is_event: self.is_event,
            extracted_fields,
            processed_at,
            delivered: self.sent_to_bot,
        })
    }
}

#[async_trait]
impl PostStore for SqliteStore {
    async fn has_processed(&self, source_id: &str, post_id: i64) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM processed_posts WHERE channel_username = ? AND post_id = ?",
        )
        .bind(source_id)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to check processed post")?;

        Ok(row.is_some())
    }

    async fn record(&self, record: &PostRecord) -> Result<RecordOutcome> {
        let extracted_data = serde_json::to_string(&record.extracted_fields)
            .context("Failed to serialize extracted fields")?;

        let result = sqlx::query(
            r#"
            INSERT INTO processed_posts
                (channel_username, post_id, post_date, post_text, is_event, extracted_data, processed_at, sent_to_bot)
            VALUES (?, ?, ?, ?, ?, ?, ?, 0)
            ON CONFLICT(channel_username, post_id) DO NOTHING
            "#,
        )
        .bind(&record.source_id)
        .bind(record.post_id)
        .bind(&record.post_timestamp)
        .bind(&record.raw_text)
        .bind(record.is_event)
        .bind(&extracted_data)
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .context("Failed to record processed post")?;

        Ok(if result.rows_affected() > 0 {
            RecordOutcome::Inserted
        } else {
            RecordOutcome::AlreadyRecorded
        })
    }

    async fn mark_delivered(&self, source_id: &str, post_id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE processed_posts SET sent_to_bot = 1 WHERE channel_username = ? AND post_id = ?",
        )
        .bind(source_id)
        .bind(post_id)
        .execute(&self.pool)
        .await
        .context("Failed to mark post delivered")?;

        Ok(())
    }

    async fn recent_events(&self, limit: usize) -> Result<Vec<ProcessedPost>> {
        let mut events = Vec::with_capacity(limit);
        if limit == 0 {
            return Ok(events);
        }

        let query = format!(
            "SELECT {} FROM processed_posts \
             WHERE is_event = 1 AND sent_to_bot = 1 \
             ORDER BY processed_at DESC, id DESC",
            POST_COLUMNS
        );
        let mut rows = sqlx::query_as::<_, PostRow>(&query).fetch(&self.pool);

        // Usability is judged on the decoded fields, so filter while streaming
        while let Some(row) = rows.try_next().await.context("Failed to load recent events")? {
            let post = row.into_processed_post()?;
            if post.extracted_fields.is_usable() {
                events.push(post);
                if events.len() == limit {
                    break;
                }
            }
        }

        Ok(events)
    }
}

#[async_trait]
impl SubscriberStore for SqliteStore {
    async fn add_subscriber(&self, subscriber: &Subscriber) -> Result<()> {
        let now = timestamp(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO bot_users (chat_id, username, first_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(chat_id) DO UPDATE SET
                username = COALESCE(excluded.username, bot_users.username),
                first_name = COALESCE(excluded.first_name, bot_users.first_name),
                updated_at = excluded.updated_at
            "#,
        )
        .bind(subscriber.chat_id)
        .bind(&subscriber.username)
        .bind(&subscriber.first_name)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .context("Failed to save subscriber")?;

        Ok(())
    }

    async fn subscriber_chat_ids(&self) -> Result<Vec<i64>> {
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT chat_id FROM bot_users ORDER BY created_at, chat_id")
                .fetch_all(&self.pool)
                .await
                .context("Failed to load subscribers")?;

        Ok(rows.into_iter().map(|(chat_id,)| chat_id).collect())
    }
}
