//! Rendezvous Backend Module
//!
//! Short-lived codes that let two parties find each other.
//!
//! Clean Architecture structure:
//! - `domain/` - Entries, codes, identities, repository traits
//! - `application/` - Use cases and the reaper
//! - `infra/` - In-memory and PostgreSQL registries
//! - `presentation/` - HTTP handlers
//!
//! ## Pairing Model
//! - Anonymous: the first caller opens a waiting slot, the next caller joins
//!   it; claim-or-create is a single registry step
//! - Directed: a sender requests a receiver by name; one live code per
//!   unordered pair, kept after acceptance until it expires or is cancelled
//! - Expired entries behave exactly like absent ones

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::RendezvousConfig;
pub use application::reap::{ReapExpiredUseCase, spawn_reaper};
pub use error::{RendezvousError, RendezvousResult};
pub use infra::memory::MemoryRendezvousRepository;
pub use infra::postgres::PgRendezvousRepository;
pub use presentation::router::rendezvous_router;

#[cfg(test)]
mod tests;
