//! Reap Process
//!
//! Registry reads already evict expired entries they touch. The periodic
//! sweep here bounds memory for entries nobody reads again.

use crate::domain::repository::CodeRegistry;
use crate::error::RendezvousResult;
use platform::clock::SharedClock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Reap Expired Use Case
pub struct ReapExpiredUseCase<R>
where
    R: CodeRegistry,
{
    repo: Arc<R>,
    clock: SharedClock,
}

impl<R> ReapExpiredUseCase<R>
where
    R: CodeRegistry,
{
    pub fn new(repo: Arc<R>, clock: SharedClock) -> Self {
        Self { repo, clock }
    }

    /// Remove every expired entry; returns how many went
    pub async fn execute(&self) -> RendezvousResult<u64> {
        let removed = self
            .repo
            .remove_expired_before(self.clock.now_ms())
            .await?;

        if removed > 0 {
            tracing::info!(removed = removed, "Reaped expired entries");
        } else {
            tracing::trace!("Reap found nothing to remove");
        }
        Ok(removed)
    }
}

/// Run the sweep every `interval` until `shutdown` turns true or its sender
/// is dropped. A failed sweep is logged and the next tick tries again.
pub fn spawn_reaper<R>(
    use_case: ReapExpiredUseCase<R>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    R: CodeRegistry + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval_ms = interval.as_millis() as u64, "Reaper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = use_case.execute().await {
                        tracing::warn!(error = %e, "Reap sweep failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Reaper stopped");
    })
}
