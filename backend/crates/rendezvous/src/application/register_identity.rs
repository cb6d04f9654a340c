//! Register Identity Use Case

use crate::domain::repository::IdentityRepository;
use crate::domain::value_objects::Identity;
use crate::error::RendezvousResult;
use platform::clock::SharedClock;
use std::sync::Arc;

/// Register Identity Use Case
pub struct RegisterIdentityUseCase<R>
where
    R: IdentityRepository,
{
    repo: Arc<R>,
    clock: SharedClock,
}

impl<R> RegisterIdentityUseCase<R>
where
    R: IdentityRepository,
{
    pub fn new(repo: Arc<R>, clock: SharedClock) -> Self {
        Self { repo, clock }
    }

    /// Returns the normalized identity that was stored
    pub async fn execute(&self, name: &str) -> RendezvousResult<Identity> {
        let identity = Identity::new(name)?;
        self.repo.register(&identity, self.clock.now_ms()).await?;

        tracing::info!(identity = %identity, "Identity registered");
        Ok(identity)
    }
}
