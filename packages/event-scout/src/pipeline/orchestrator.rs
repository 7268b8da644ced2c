//! Per-post state machine and per-cycle driver.
//!
//! ```text
//! post ─► seen? ──yes──► AlreadyProcessed
//!          │
//!          ├─► stale? ──yes──► record(non-event) ─► Stale
//!          ├─► lexical? ──no──► record(non-event) ─► FilteredOut
//!          ├─► classify ─► record ──lost race──► LostRace
//!          ├─► not an event ─► NotEvent
//!          ├─► nothing usable ─► Unusable
//!          └─► format ─► deliver ─► mark delivered ─► Delivered
//! ```
//!
//! Only the writer whose insert succeeded dispatches, so a post is
//! delivered at most once even when two cycles race on it.

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domains::channels::{source_link, ChannelPost};
use crate::domains::detection::staleness::DEFAULT_HORIZON_DAYS;
use crate::domains::detection::{
    check_staleness, quick_check, Classification, ClassificationError, Staleness,
};
use crate::domains::notifications::format_event_message;
use crate::domains::posts::{PostRecord, RecordOutcome};
use crate::kernel::PipelineDeps;

/// Tunables for one polling cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub staleness_horizon_days: i64,
    /// Newest posts fetched per channel per cycle
    pub fetch_limit: usize,
    /// Channels processed at once; 1 keeps configuration order
    pub source_concurrency: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            staleness_horizon_days: DEFAULT_HORIZON_DAYS,
            fetch_limit: 50,
            source_concurrency: 1,
        }
    }
}

/// Where a post's processing ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    AlreadyProcessed,
    Stale,
    FilteredOut,
    NotEvent,
    Unusable,
    Delivered,
    /// Another writer recorded the post first
    LostRace,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub sources: usize,
    pub failed_sources: usize,
    pub fetched: usize,
    pub failed_posts: usize,
    pub already_processed: usize,
    pub stale: usize,
    pub filtered_out: usize,
    pub not_event: usize,
    pub unusable: usize,
    pub delivered: usize,
    pub lost_race: usize,
}

impl CycleStats {
    pub fn record(&mut self, outcome: PostOutcome) {
        let counter = match outcome {
            PostOutcome::AlreadyProcessed => &mut self.already_processed,
            PostOutcome::Stale => &mut self.stale,
            PostOutcome::FilteredOut => &mut self.filtered_out,
            PostOutcome::NotEvent => &mut self.not_event,
            PostOutcome::Unusable => &mut self.unusable,
            PostOutcome::Delivered => &mut self.delivered,
            PostOutcome::LostRace => &mut self.lost_race,
        };
        *counter += 1;
    }

    pub fn merge(&mut self, other: &CycleStats) {
        self.sources += other.sources;
        self.failed_sources += other.failed_sources;
        self.fetched += other.fetched;
        self.failed_posts += other.failed_posts;
        self.already_processed += other.already_processed;
        self.stale += other.stale;
        self.filtered_out += other.filtered_out;
        self.not_event += other.not_event;
        self.unusable += other.unusable;
        self.delivered += other.delivered;
        self.lost_race += other.lost_race;
    }
}

/// Run one post through the pipeline.
///
/// Errors are store or delivery failures; classifier failures are folded
/// into a non-event here and never surface.
pub async fn process_post(
    deps: &PipelineDeps,
    settings: &PipelineSettings,
    source_id: &str,
    post: &ChannelPost,
    now: DateTime<Utc>,
) -> Result<PostOutcome> {
    if deps.posts.has_processed(source_id, post.id).await? {
        return Ok(PostOutcome::AlreadyProcessed);
    }

    match check_staleness(&post.timestamp, now, settings.staleness_horizon_days) {
        Staleness::Stale => {
            debug!(source_id, post_id = post.id, timestamp = %post.timestamp, "Post is stale");
            deps.posts.record(&PostRecord::non_event(source_id, post)).await?;
            return Ok(PostOutcome::Stale);
        }
        Staleness::Unparsable => {
            warn!(
                source_id,
                post_id = post.id,
                timestamp = %post.timestamp,
                "Unparsable post timestamp, treating as fresh"
            );
        }
        Staleness::Fresh => {}
    }

    if !quick_check(&post.text) {
        debug!(source_id, post_id = post.id, "Post rejected by lexical filter");
        deps.posts.record(&PostRecord::non_event(source_id, post)).await?;
        return Ok(PostOutcome::FilteredOut);
    }

    debug!(source_id, post_id = post.id, "Post passed lexical filter, classifying");
    let classification = match deps.classifier.classify(&post.text).await {
        Ok(classification) => classification,
        Err(e) => {
            warn!(source_id, post_id = post.id, error = %e, "Classification failed, treating as non-event");
            if let ClassificationError::MalformedResponse { raw, .. } = &e {
                debug!(source_id, post_id = post.id, raw = %raw, "Malformed classifier response");
            }
            Classification::non_event()
        }
    };

    let record = PostRecord::new(
        source_id,
        post,
        classification.is_event,
        classification.fields.clone(),
    );
    if deps.posts.record(&record).await? == RecordOutcome::AlreadyRecorded {
        info!(source_id, post_id = post.id, "Post recorded concurrently, skipping delivery");
        return Ok(PostOutcome::LostRace);
    }

    if !classification.is_event {
        return Ok(PostOutcome::NotEvent);
    }

    if !classification.fields.is_usable() {
        info!(source_id, post_id = post.id, "Event has no usable fields, not delivering");
        return Ok(PostOutcome::Unusable);
    }

    let message = format_event_message(&classification.fields, &source_link(source_id, post.id));
    let report = deps.dispatcher.deliver(&message, None).await?;
    deps.posts.mark_delivered(source_id, post.id).await?;

    info!(
        source_id,
        post_id = post.id,
        recipients = report.recipients,
        delivered = report.delivered,
        failed = report.failed,
        "Event delivered"
    );

    Ok(PostOutcome::Delivered)
}

/// Fetch one channel and process its new posts oldest first.
///
/// Stops between posts once `shutdown` is cancelled. A failing post is
/// logged and counted; only a failed fetch fails the channel.
pub async fn process_channel(
    deps: &PipelineDeps,
    settings: &PipelineSettings,
    source_id: &str,
    shutdown: &CancellationToken,
) -> Result<CycleStats> {
    let mut stats = CycleStats {
        sources: 1,
        ..Default::default()
    };

    let fetched = deps.reader.fetch_new_posts(source_id, settings.fetch_limit).await?;
    stats.fetched = fetched.len();

    let mut pending = Vec::with_capacity(fetched.len());
    for post in fetched {
        match deps.posts.has_processed(source_id, post.id).await {
            Ok(true) => stats.record(PostOutcome::AlreadyProcessed),
            // A lookup failure is retried inside process_post
            Ok(false) | Err(_) => pending.push(post),
        }
    }
    pending.sort_by_key(|post| post.id);

    info!(
        source_id,
        fetched = stats.fetched,
        new = pending.len(),
        "Channel fetched"
    );

    for post in &pending {
        if shutdown.is_cancelled() {
            info!(source_id, "Shutdown requested, stopping channel");
            break;
        }

        match process_post(deps, settings, source_id, post, Utc::now()).await {
            Ok(outcome) => {
                debug!(source_id, post_id = post.id, outcome = ?outcome, "Post processed");
                stats.record(outcome);
            }
            Err(e) => {
                stats.failed_posts += 1;
                error!(source_id, post_id = post.id, error = %e, "Failed to process post");
            }
        }
    }

    Ok(stats)
}

/// Process every channel once; failures are isolated per channel.
pub async fn run_cycle(
    deps: &PipelineDeps,
    settings: &PipelineSettings,
    channels: &[String],
    shutdown: &CancellationToken,
) -> CycleStats {
    let concurrency = settings.source_concurrency.max(1);

    let results: Vec<CycleStats> = stream::iter(channels.iter().cloned())
        .map(|channel| async move {
            if shutdown.is_cancelled() {
                return CycleStats::default();
            }
            match process_channel(deps, settings, &channel, shutdown).await {
                Ok(stats) => stats,
                Err(e) => {
                    error!(source_id = %channel, error = %e, "Failed to process channel");
                    CycleStats {
                        sources: 1,
                        failed_sources: 1,
                        ..Default::default()
                    }
                }
            }
        })
        .buffered(concurrency)
        .collect()
        .await;

    let mut total = CycleStats::default();
    for stats in &results {
        total.merge(stats);
    }
    total
}
