//! Long-running services and the host that supervises them.
//!
//! Every service gets a child of one shared [`CancellationToken`]. Ctrl+C
//! (or an explicit cancel) stops all of them; a service that returns on its
//! own does not stop its siblings.

use anyhow::Result;
use async_trait::async_trait;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[async_trait]
pub trait Service: Send + 'static {
    fn name(&self) -> &'static str;

    /// Run until `shutdown` is cancelled or the service has nothing left to do.
    async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()>;
}

#[derive(Default)]
pub struct ServiceHost {
    services: Vec<Box<dyn Service>>,
    shutdown: CancellationToken,
}

impl ServiceHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(mut self, service: impl Service) -> Self {
        self.services.push(Box::new(service));
        self
    }

    /// Token that stops every hosted service when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run all services until they finish or Ctrl+C is received.
    pub async fn run_until_shutdown(self) {
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
                shutdown.cancel();
            }
        });

        self.run().await;
    }

    /// Run all services until they finish; stopping is left to the token.
    pub async fn run(self) {
        let mut tasks = JoinSet::new();

        for service in self.services {
            let name = service.name();
            let token = self.shutdown.child_token();
            info!(service = name, "starting service");

            tasks.spawn(async move {
                let result = service.run(token).await;
                (name, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, Ok(()))) => info!(service = name, "service stopped"),
                Ok((name, Err(e))) => error!(service = name, error = %e, "service failed"),
                Err(e) => error!(error = %e, "service task panicked"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct WaitForShutdown(Arc<AtomicUsize>);

    #[async_trait]
    impl Service for WaitForShutdown {
        fn name(&self) -> &'static str {
            "wait"
        }

        async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()> {
            shutdown.cancelled().await;
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Service for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn run(self: Box<Self>, _shutdown: CancellationToken) -> Result<()> {
            anyhow::bail!("boom")
        }
    }

    #[tokio::test]
    async fn test_cancel_stops_all_services() {
        let stopped = Arc::new(AtomicUsize::new(0));
        let host = ServiceHost::new()
            .with_service(WaitForShutdown(stopped.clone()))
            .with_service(WaitForShutdown(stopped.clone()))
            .with_service(Failing);
        let token = host.shutdown_token();

        let handle = tokio::spawn(host.run());
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        token.cancel();
        handle.await.unwrap();

        assert_eq!(stopped.load(Ordering::SeqCst), 2);
    }
}
