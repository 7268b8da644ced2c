//! Polling worker service.
//!
//! Runs one cycle immediately, then one per interval:
//!
//! ```text
//! PollingWorker
//!     │
//!     ├─► Reload channel list
//!     ├─► run_cycle (spawned task; a panic is logged, not fatal)
//!     │       └─► process_channel → process_post
//!     └─► Sleep (interrupted by shutdown)
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::orchestrator::{run_cycle, PipelineSettings};
use crate::domains::channels::load_channels;
use crate::kernel::{PipelineDeps, Service};

pub struct PollingWorker {
    deps: PipelineDeps,
    settings: Arc<PipelineSettings>,
    channels_path: PathBuf,
    interval: Duration,
}

impl PollingWorker {
    pub fn new(
        deps: PipelineDeps,
        settings: PipelineSettings,
        channels_path: impl Into<PathBuf>,
        interval: Duration,
    ) -> Self {
        Self {
            deps,
            settings: Arc::new(settings),
            channels_path: channels_path.into(),
            interval,
        }
    }
}

#[async_trait::async_trait]
impl Service for PollingWorker {
    fn name(&self) -> &'static str {
        "polling-worker"
    }

    async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()> {
        info!(
            interval_secs = self.interval.as_secs_f64(),
            channels_path = %self.channels_path.display(),
            fetch_limit = self.settings.fetch_limit,
            source_concurrency = self.settings.source_concurrency,
            "polling worker starting"
        );

        let mut cycle: u64 = 0;
        loop {
            if shutdown.is_cancelled() {
                break;
            }
            cycle += 1;

            let channels = load_channels(&self.channels_path);
            if channels.is_empty() {
                warn!(path = %self.channels_path.display(), "No channels configured");
            } else {
                let deps = self.deps.clone();
                let settings = self.settings.clone();
                let token = shutdown.clone();

                let handle = tokio::spawn(async move {
                    run_cycle(&deps, &settings, &channels, &token).await
                });

                match handle.await {
                    Ok(stats) => info!(
                        cycle,
                        sources = stats.sources,
                        failed_sources = stats.failed_sources,
                        fetched = stats.fetched,
                        failed_posts = stats.failed_posts,
                        already_processed = stats.already_processed,
                        stale = stats.stale,
                        filtered_out = stats.filtered_out,
                        not_event = stats.not_event,
                        unusable = stats.unusable,
                        delivered = stats.delivered,
                        lost_race = stats.lost_race,
                        "cycle complete"
                    ),
                    Err(e) => error!(cycle, error = %e, "cycle task failed"),
                }
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("polling worker stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::channels::ChannelPost;
    use crate::kernel::test_dependencies::{MockAI, MockChannelReader, TestDependencies};

    #[tokio::test]
    async fn test_worker_runs_cycle_and_stops_on_shutdown() {
        let dir = std::env::temp_dir().join(format!("event-scout-worker-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let channels_path = dir.join("channels.json");
        std::fs::write(&channels_path, r#"["@rustmeetups"]"#).unwrap();

        let posted = chrono::Utc::now().to_rfc3339();
        let test = TestDependencies::new()
            .mock_reader(MockChannelReader::new().with_posts(
                "rustmeetups",
                vec![ChannelPost::new(1, "Rust meetup tomorrow", posted)],
            ))
            .mock_ai(MockAI::new().with_response(r#"{"is_event": true, "title": "Rust meetup"}"#));

        let worker = PollingWorker::new(
            test.build_deps(),
            PipelineSettings::default(),
            &channels_path,
            Duration::from_secs(3600),
        );
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(Box::new(worker).run(shutdown.clone()));

        for _ in 0..100 {
            if test.store.post_count() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        shutdown.cancel();
        handle.await.unwrap().unwrap();

        assert!(test.store.find_post("rustmeetups", 1).unwrap().delivered);
        assert_eq!(test.reader.calls(), vec!["rustmeetups".to_string()]);
        std::fs::remove_dir_all(&dir).ok();
    }
}
