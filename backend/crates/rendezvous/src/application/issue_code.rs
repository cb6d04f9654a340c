//! Code Issuance
//!
//! Generate a fresh code and hand it to a store step, retrying while the
//! store reports `DuplicateCode`. Shared by the anonymous and directed flows.

use crate::domain::services::CodeGenerator;
use crate::domain::value_objects::Code;
use crate::error::{RendezvousError, RendezvousResult};
use std::future::Future;

/// Run `store` with freshly generated codes until it stops colliding
///
/// Any outcome other than `DuplicateCode` is returned as is. After
/// `max_attempts` collisions the result is `CodeSpaceExhausted`.
pub(crate) async fn issue_code<T, F, Fut>(
    generator: &CodeGenerator,
    max_attempts: u32,
    mut store: F,
) -> RendezvousResult<T>
where
    F: FnMut(Code) -> Fut,
    Fut: Future<Output = RendezvousResult<T>>,
{
    for attempt in 1..=max_attempts {
        match store(generator.generate()).await {
            Err(RendezvousError::DuplicateCode) => {
                tracing::debug!(attempt = attempt, "Generated code collided, retrying");
            }
            outcome => return outcome,
        }
    }

    Err(RendezvousError::CodeSpaceExhausted {
        attempts: max_attempts,
    })
}
