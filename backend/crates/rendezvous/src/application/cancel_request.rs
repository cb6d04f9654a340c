//! Cancel Request Use Case

use crate::application::PairInput;
use crate::domain::repository::CodeRegistry;
use crate::error::{RendezvousError, RendezvousResult};
use platform::clock::SharedClock;
use std::sync::Arc;

/// Cancel Request Use Case
///
/// Deletes the directed entry for the pair, accepted or not. `NotFound`
/// without side effects when there is no live pairing.
pub struct CancelRequestUseCase<R>
where
    R: CodeRegistry,
{
    repo: Arc<R>,
    clock: SharedClock,
}

impl<R> CancelRequestUseCase<R>
where
    R: CodeRegistry,
{
    pub fn new(repo: Arc<R>, clock: SharedClock) -> Self {
        Self { repo, clock }
    }

    pub async fn execute(&self, input: PairInput) -> RendezvousResult<()> {
        let pair = input.pair_key()?;

        let removed = self
            .repo
            .remove_directed(&pair, self.clock.now_ms())
            .await?
            .ok_or(RendezvousError::NotFound)?;

        tracing::info!(code = %removed.code, "Directed request cancelled");
        Ok(())
    }
}
