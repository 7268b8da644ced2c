//! Long-polling bot service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::handlers::BotHandler;
use crate::kernel::{BaseChatBot, PipelineDeps, Service};

/// Server-side long-poll timeout
const POLL_TIMEOUT_SECS: u64 = 30;
/// Pause after a failed poll
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

pub struct BotService {
    bot: Arc<dyn BaseChatBot>,
    handler: BotHandler,
    poll_timeout_secs: u64,
    error_backoff: Duration,
}

impl BotService {
    pub fn new(deps: &PipelineDeps) -> Self {
        Self {
            bot: deps.bot.clone(),
            handler: BotHandler::new(
                deps.bot.clone(),
                deps.posts.clone(),
                deps.subscribers.clone(),
            ),
            poll_timeout_secs: POLL_TIMEOUT_SECS,
            error_backoff: ERROR_BACKOFF,
        }
    }

    pub fn with_poll_timeout(mut self, secs: u64) -> Self {
        self.poll_timeout_secs = secs;
        self
    }

    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }
}

#[async_trait::async_trait]
impl Service for BotService {
    fn name(&self) -> &'static str {
        "bot"
    }

    async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()> {
        info!("bot service starting");

        let mut offset: Option<i64> = None;
        loop {
            let polled = tokio::select! {
                _ = shutdown.cancelled() => break,
                polled = self.bot.poll_updates(offset, self.poll_timeout_secs) => polled,
            };

            let updates = match polled {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(error = %e, "Failed to poll bot updates");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.error_backoff) => continue,
                    }
                }
            };

            for update in updates {
                offset = Some(offset.map_or(update.update_id + 1, |o| o.max(update.update_id + 1)));

                if let Err(e) = self.handler.handle(&update).await {
                    error!(update_id = update.update_id, error = %e, "Failed to handle bot update");
                }
            }
        }

        info!("bot service stopped");
        Ok(())
    }
}
