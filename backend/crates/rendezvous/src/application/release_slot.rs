//! Release Slot Use Case
//!
//! The waiting party gives up on its anonymous slot before anyone joins.

use crate::domain::entities::Entry;
use crate::domain::repository::CodeRegistry;
use crate::domain::value_objects::Code;
use crate::error::{RendezvousError, RendezvousResult};
use platform::clock::SharedClock;
use std::sync::Arc;

/// Release Slot Use Case
///
/// `NotFound` if the code is absent, expired, directed, or already paired.
pub struct ReleaseSlotUseCase<R>
where
    R: CodeRegistry,
{
    repo: Arc<R>,
    clock: SharedClock,
}

impl<R> ReleaseSlotUseCase<R>
where
    R: CodeRegistry,
{
    pub fn new(repo: Arc<R>, clock: SharedClock) -> Self {
        Self { repo, clock }
    }

    pub async fn execute(&self, code: &str) -> RendezvousResult<()> {
        let code = Code::from_input(code);

        self.repo
            .remove_if(&code, self.clock.now_ms(), Entry::is_waiting)
            .await?
            .ok_or(RendezvousError::NotFound)?;

        tracing::info!(code = %code, "Anonymous slot released");
        Ok(())
    }
}
