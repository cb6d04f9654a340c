//! Lookup Code Use Case

use crate::domain::entities::Entry;
use crate::domain::repository::CodeRegistry;
use crate::domain::value_objects::Code;
use crate::error::{RendezvousError, RendezvousResult};
use platform::clock::SharedClock;
use std::sync::Arc;

/// Lookup Code Use Case
///
/// Resolve a code to its live entry. Absent and expired codes are both
/// `NotFound`.
pub struct LookupCodeUseCase<R>
where
    R: CodeRegistry,
{
    repo: Arc<R>,
    clock: SharedClock,
}

impl<R> LookupCodeUseCase<R>
where
    R: CodeRegistry,
{
    pub fn new(repo: Arc<R>, clock: SharedClock) -> Self {
        Self { repo, clock }
    }

    pub async fn execute(&self, code: &str) -> RendezvousResult<Entry> {
        let code = Code::from_input(code);
        if code.as_str().is_empty() {
            return Err(RendezvousError::NotFound);
        }

        self.repo
            .get(&code, self.clock.now_ms())
            .await?
            .ok_or(RendezvousError::NotFound)
    }
}
