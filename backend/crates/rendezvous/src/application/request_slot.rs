//! Request Slot Use Case
//!
//! Anonymous first-come-first-served pairing: join the oldest waiting slot,
//! or open a new one.

use crate::application::config::RendezvousConfig;
use crate::application::issue_code::issue_code;
use crate::domain::entities::Entry;
use crate::domain::repository::{AnonymousSlot, CodeRegistry};
use crate::domain::value_objects::{Code, SlotStatus};
use crate::error::RendezvousResult;
use platform::clock::SharedClock;
use std::sync::Arc;

/// Output DTO for request slot
#[derive(Debug, Clone)]
pub struct RequestSlotOutput {
    pub code: Code,
    pub status: SlotStatus,
    pub expires_at_ms: i64,
}

/// Request Slot Use Case
pub struct RequestSlotUseCase<R>
where
    R: CodeRegistry,
{
    repo: Arc<R>,
    config: Arc<RendezvousConfig>,
    clock: SharedClock,
}

impl<R> RequestSlotUseCase<R>
where
    R: CodeRegistry,
{
    pub fn new(repo: Arc<R>, config: Arc<RendezvousConfig>, clock: SharedClock) -> Self {
        Self {
            repo,
            config,
            clock,
        }
    }

    pub async fn execute(&self) -> RendezvousResult<RequestSlotOutput> {
        let generator = self.config.generator()?;
        let now_ms = self.clock.now_ms();
        let ttl_ms = self.config.anonymous_ttl_ms();
        let repo = &self.repo;

        let slot = issue_code(&generator, self.config.max_generation_attempts, |code| {
            let candidate = Entry::anonymous(code, now_ms, ttl_ms);
            async move { repo.claim_or_insert_anonymous(&candidate, now_ms).await }
        })
        .await?;

        let (entry, status) = match slot {
            AnonymousSlot::Claimed(entry) => {
                tracing::info!(code = %entry.code, "Anonymous slot paired");
                (entry, SlotStatus::Paired)
            }
            AnonymousSlot::Created(entry) => {
                tracing::info!(
                    code = %entry.code,
                    expires_at_ms = entry.expires_at_ms,
                    "Anonymous slot opened"
                );
                (entry, SlotStatus::Waiting)
            }
        };

        Ok(RequestSlotOutput {
            code: entry.code,
            status,
            expires_at_ms: entry.expires_at_ms,
        })
    }
}
