//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.
//! One use case per pairing operation, plus the reaper.

pub mod accept_request;
pub mod cancel_request;
pub mod config;
pub mod generate_payload;
mod issue_code;
pub mod lookup_code;
pub mod reap;
pub mod register_identity;
pub mod release_slot;
pub mod request_slot;
pub mod send_request;

use crate::domain::value_objects::{Identity, PairKey};
use crate::error::RendezvousResult;

/// Sender and receiver as supplied by a caller, not yet validated
#[derive(Debug, Clone)]
pub struct PairInput {
    pub sender: String,
    pub receiver: String,
}

impl PairInput {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
        }
    }

    /// Normalized `(sender, receiver)`; `InvalidIdentity` if either fails
    pub fn identities(&self) -> RendezvousResult<(Identity, Identity)> {
        Ok((Identity::new(&self.sender)?, Identity::new(&self.receiver)?))
    }

    pub fn pair_key(&self) -> RendezvousResult<PairKey> {
        let (sender, receiver) = self.identities()?;
        Ok(PairKey::new(sender, receiver))
    }
}
