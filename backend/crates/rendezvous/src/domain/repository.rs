//! Repository Traits
//!
//! Interfaces for the code registry and identity store. Implementations are
//! in the infrastructure layer.
//!
//! Every method is one atomic step against shared state. Callers never read
//! an entry in one call and write it back in another; read-then-write
//! sequences (`claim_waiting_anonymous`, `find_or_insert_directed`,
//! `update`, `remove_if`) exist so that they do not have to.
//!
//! `now_ms` is passed in rather than read from a clock so that eviction
//! and claims agree on a single instant.

use crate::domain::entities::Entry;
use crate::domain::value_objects::{Code, Identity, PairKey};
use crate::error::RendezvousResult;

/// Outcome of an idempotent directed insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectedSlot {
    /// No live entry existed for the pair; this one was stored
    Created(Entry),
    /// A live entry already existed for the pair and is returned untouched
    Existing(Entry),
}

impl DirectedSlot {
    pub fn is_created(&self) -> bool {
        matches!(self, DirectedSlot::Created(_))
    }

    pub fn into_entry(self) -> Entry {
        match self {
            DirectedSlot::Created(entry) | DirectedSlot::Existing(entry) => entry,
        }
    }
}

/// Outcome of an anonymous slot request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnonymousSlot {
    /// A waiting entry existed and was moved to two parties
    Claimed(Entry),
    /// Nothing was waiting; the candidate was stored as a new waiting entry
    Created(Entry),
}

impl AnonymousSlot {
    pub fn into_entry(self) -> Entry {
        match self {
            AnonymousSlot::Claimed(entry) | AnonymousSlot::Created(entry) => entry,
        }
    }
}

/// Code registry trait
#[trait_variant::make(CodeRegistry: Send)]
pub trait LocalCodeRegistry {
    /// Store a new entry; `DuplicateCode` if its code maps to a live entry
    async fn insert(&self, entry: &Entry, now_ms: i64) -> RendezvousResult<()>;

    /// Live entry for `code`; an expired one is evicted and reported absent
    async fn get(&self, code: &Code, now_ms: i64) -> RendezvousResult<Option<Entry>>;

    /// Oldest live anonymous entry with one party (ties broken by code)
    async fn find_waiting_anonymous(&self, now_ms: i64) -> RendezvousResult<Option<Entry>>;

    /// Find the oldest waiting anonymous entry and move it to two parties,
    /// as one step. Returns the claimed entry.
    async fn claim_waiting_anonymous(&self, now_ms: i64) -> RendezvousResult<Option<Entry>>;

    /// Claim the oldest waiting anonymous entry, or store `candidate` as a
    /// new waiting entry if there is none, as one step. Two concurrent
    /// callers with nothing waiting therefore meet on one code.
    /// `DuplicateCode` only when the candidate was needed and its code is
    /// taken.
    async fn claim_or_insert_anonymous(
        &self,
        candidate: &Entry,
        now_ms: i64,
    ) -> RendezvousResult<AnonymousSlot>;

    /// Live directed entry for the unordered pair
    async fn find_directed(&self, pair: &PairKey, now_ms: i64) -> RendezvousResult<Option<Entry>>;

    /// Return the live directed entry for the entry's pair, or store `entry`
    /// if there is none. `DuplicateCode` only when a new entry was needed and
    /// its code is taken.
    async fn find_or_insert_directed(
        &self,
        entry: &Entry,
        now_ms: i64,
    ) -> RendezvousResult<DirectedSlot>;

    /// Apply `mutate` to the live entry for `code` in place
    ///
    /// `NotFound` if absent or expired. An error from `mutate` leaves the
    /// entry unchanged and is returned as is. The code of the entry cannot
    /// be changed.
    async fn update<F>(&self, code: &Code, now_ms: i64, mutate: F) -> RendezvousResult<Entry>
    where
        F: FnOnce(&mut Entry) -> RendezvousResult<()> + Send;

    /// Delete the entry for `code`, live or not
    async fn remove(&self, code: &Code) -> RendezvousResult<Option<Entry>>;

    /// Delete the live entry for `code` if `predicate` holds
    async fn remove_if<P>(
        &self,
        code: &Code,
        now_ms: i64,
        predicate: P,
    ) -> RendezvousResult<Option<Entry>>
    where
        P: FnOnce(&Entry) -> bool + Send;

    /// Delete the directed entry for the pair; `None` if there was no live one
    async fn remove_directed(&self, pair: &PairKey, now_ms: i64)
    -> RendezvousResult<Option<Entry>>;

    /// Delete every entry with `expires_at_ms <= now_ms`
    async fn remove_expired_before(&self, now_ms: i64) -> RendezvousResult<u64>;

    /// Entries currently stored, expired ones included until reaped
    async fn count(&self) -> RendezvousResult<u64>;
}

/// Identity repository trait
#[trait_variant::make(IdentityRepository: Send)]
pub trait LocalIdentityRepository {
    /// Register a new identity; `AlreadyExists` if taken
    async fn register(&self, identity: &Identity, now_ms: i64) -> RendezvousResult<()>;

    async fn exists(&self, identity: &Identity) -> RendezvousResult<bool>;
}
