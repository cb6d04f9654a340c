//! Accept Request Use Case

use crate::application::PairInput;
use crate::domain::repository::CodeRegistry;
use crate::domain::value_objects::Code;
use crate::error::{RendezvousError, RendezvousResult};
use platform::clock::SharedClock;
use std::sync::Arc;

/// Output DTO for accept request
#[derive(Debug, Clone)]
pub struct AcceptRequestOutput {
    pub code: Code,
    pub expires_at_ms: i64,
}

/// Accept Request Use Case
///
/// Marks the pending request for the pair as accepted. The entry is kept
/// until it expires or is cancelled, so the code keeps working as a shared
/// secret.
pub struct AcceptRequestUseCase<R>
where
    R: CodeRegistry,
{
    repo: Arc<R>,
    clock: SharedClock,
}

impl<R> AcceptRequestUseCase<R>
where
    R: CodeRegistry,
{
    pub fn new(repo: Arc<R>, clock: SharedClock) -> Self {
        Self { repo, clock }
    }

    pub async fn execute(&self, input: PairInput) -> RendezvousResult<AcceptRequestOutput> {
        let pair = input.pair_key()?;
        let now_ms = self.clock.now_ms();

        let pending = self
            .repo
            .find_directed(&pair, now_ms)
            .await?
            .ok_or(RendezvousError::NotFound)?;

        // the mutator checks the pair again under the registry's lock, so a
        // cancel between the two calls surfaces as NotFound
        let accepted = self
            .repo
            .update(&pending.code, now_ms, move |entry| entry.accept(&pair))
            .await?;

        tracing::info!(code = %accepted.code, "Directed request accepted");

        Ok(AcceptRequestOutput {
            code: accepted.code,
            expires_at_ms: accepted.expires_at_ms,
        })
    }
}
