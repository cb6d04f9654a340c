//! Send Request Use Case
//!
//! Directed pairing between two registered identities. Idempotent: a live
//! entry for the unordered pair is returned untouched.

use crate::application::PairInput;
use crate::application::config::RendezvousConfig;
use crate::application::issue_code::issue_code;
use crate::domain::entities::Entry;
use crate::domain::repository::{CodeRegistry, IdentityRepository};
use crate::domain::value_objects::Code;
use crate::error::{RendezvousError, RendezvousResult};
use platform::clock::SharedClock;
use std::sync::Arc;

/// Output DTO for send request
#[derive(Debug, Clone)]
pub struct SendRequestOutput {
    pub code: Code,
    pub expires_at_ms: i64,
    /// False when an existing request was returned
    pub created: bool,
}

/// Send Request Use Case
pub struct SendRequestUseCase<R>
where
    R: CodeRegistry + IdentityRepository,
{
    repo: Arc<R>,
    config: Arc<RendezvousConfig>,
    clock: SharedClock,
}

impl<R> SendRequestUseCase<R>
where
    R: CodeRegistry + IdentityRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<RendezvousConfig>, clock: SharedClock) -> Self {
        Self {
            repo,
            config,
            clock,
        }
    }

    pub async fn execute(&self, input: PairInput) -> RendezvousResult<SendRequestOutput> {
        let (sender, receiver) = input.identities()?;

        if sender == receiver {
            return Err(RendezvousError::SelfRequest);
        }
        for identity in [&sender, &receiver] {
            if !self.repo.exists(identity).await? {
                return Err(RendezvousError::ParticipantUnknown(identity.to_string()));
            }
        }

        let generator = self.config.generator()?;
        let now_ms = self.clock.now_ms();
        let ttl_ms = self.config.directed_ttl_ms();
        let repo = &self.repo;

        let slot = issue_code(&generator, self.config.max_generation_attempts, |code| {
            let candidate = Entry::directed(code, sender.clone(), receiver.clone(), now_ms, ttl_ms);
            async move { repo.find_or_insert_directed(&candidate, now_ms).await }
        })
        .await?;

        let created = slot.is_created();
        let entry = slot.into_entry();

        if created {
            tracing::info!(
                code = %entry.code,
                sender = %sender,
                receiver = %receiver,
                expires_at_ms = entry.expires_at_ms,
                "Directed request created"
            );
        } else {
            tracing::debug!(code = %entry.code, "Directed request already pending");
        }

        Ok(SendRequestOutput {
            code: entry.code,
            expires_at_ms: entry.expires_at_ms,
            created,
        })
    }
}

