//! In-Memory Repository Implementation
//!
//! One mutex over the whole registry. Operations are short map updates, and
//! a single lock gives the cross-index atomicity the claim path needs.

use crate::domain::entities::Entry;
use crate::domain::repository::{AnonymousSlot, CodeRegistry, DirectedSlot, IdentityRepository};
use crate::domain::value_objects::{Code, Identity, PairKey};
use crate::error::{RendezvousError, RendezvousResult};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Process-local repository
#[derive(Clone, Default)]
pub struct MemoryRendezvousRepository {
    state: Arc<Mutex<RegistryState>>,
}

#[derive(Default)]
struct RegistryState {
    entries: HashMap<Code, Entry>,
    /// Unordered pair -> code of its directed entry
    directed: HashMap<PairKey, Code>,
    /// Waiting anonymous entries, oldest first, ties by code
    waiting: BTreeSet<(i64, Code)>,
    identities: HashSet<Identity>,
}

impl RegistryState {
    fn store(&mut self, entry: Entry) {
        if entry.is_waiting() {
            self.waiting
                .insert((entry.created_at_ms, entry.code.clone()));
        }
        if let Some(pair) = entry.pair_key() {
            self.directed.insert(pair, entry.code.clone());
        }
        self.entries.insert(entry.code.clone(), entry);
    }

    fn take(&mut self, code: &Code) -> Option<Entry> {
        let entry = self.entries.remove(code)?;
        self.waiting.remove(&(entry.created_at_ms, entry.code.clone()));
        if let Some(pair) = entry.pair_key() {
            if self.directed.get(&pair) == Some(&entry.code) {
                self.directed.remove(&pair);
            }
        }
        Some(entry)
    }

    /// Live entry for `code`, evicting it first if it has expired
    fn live(&mut self, code: &Code, now_ms: i64) -> Option<&mut Entry> {
        if self
            .entries
            .get(code)
            .is_some_and(|entry| entry.is_expired(now_ms))
        {
            self.take(code);
            tracing::debug!(code = %code, "Evicted expired entry on access");
            return None;
        }
        self.entries.get_mut(code)
    }

    fn live_directed(&mut self, pair: &PairKey, now_ms: i64) -> Option<&mut Entry> {
        let code = self.directed.get(pair)?.clone();
        self.live(&code, now_ms)
    }

    /// Pop waiting entries oldest first until a live one can be claimed
    fn claim_oldest(&mut self, now_ms: i64) -> RendezvousResult<Option<Entry>> {
        while let Some((_, code)) = self.waiting.pop_first() {
            let Some(entry) = self.entries.get_mut(&code) else {
                continue;
            };
            if entry.is_live(now_ms) {
                entry.claim()?;
                tracing::debug!(code = %code, "Claimed waiting slot");
                return Ok(Some(entry.clone()));
            }
            self.entries.remove(&code);
            tracing::debug!(code = %code, "Dropped expired waiting slot");
        }
        Ok(None)
    }

    /// Make room for `code`: fails if a live entry holds it
    fn reserve(&mut self, code: &Code, now_ms: i64) -> RendezvousResult<()> {
        if self.live(code, now_ms).is_some() {
            return Err(RendezvousError::DuplicateCode);
        }
        Ok(())
    }
}

impl MemoryRendezvousRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        // every mutation completes before the guard drops, so a poisoned
        // state is still consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CodeRegistry for MemoryRendezvousRepository {
    async fn insert(&self, entry: &Entry, now_ms: i64) -> RendezvousResult<()> {
        let mut state = self.lock();
        state.reserve(&entry.code, now_ms)?;
        if let Some(pair) = entry.pair_key() {
            if state.live_directed(&pair, now_ms).is_some() {
                return Err(RendezvousError::AlreadyExists);
            }
        }
        state.store(entry.clone());
        Ok(())
    }

    async fn get(&self, code: &Code, now_ms: i64) -> RendezvousResult<Option<Entry>> {
        Ok(self.lock().live(code, now_ms).map(|entry| entry.clone()))
    }

    async fn find_waiting_anonymous(&self, now_ms: i64) -> RendezvousResult<Option<Entry>> {
        let mut guard = self.lock();
        let state = &mut *guard;

        while let Some((created_at_ms, code)) = state.waiting.first().cloned() {
            let live = state
                .entries
                .get(&code)
                .filter(|entry| entry.is_live(now_ms))
                .cloned();
            if live.is_some() {
                return Ok(live);
            }
            state.waiting.remove(&(created_at_ms, code.clone()));
            state.entries.remove(&code);
        }
        Ok(None)
    }

    async fn claim_waiting_anonymous(&self, now_ms: i64) -> RendezvousResult<Option<Entry>> {
        self.lock().claim_oldest(now_ms)
    }

    async fn claim_or_insert_anonymous(
        &self,
        candidate: &Entry,
        now_ms: i64,
    ) -> RendezvousResult<AnonymousSlot> {
        let mut state = self.lock();
        if let Some(claimed) = state.claim_oldest(now_ms)? {
            return Ok(AnonymousSlot::Claimed(claimed));
        }
        state.reserve(&candidate.code, now_ms)?;
        state.store(candidate.clone());
        Ok(AnonymousSlot::Created(candidate.clone()))
    }

    async fn find_directed(&self, pair: &PairKey, now_ms: i64) -> RendezvousResult<Option<Entry>> {
        Ok(self
            .lock()
            .live_directed(pair, now_ms)
            .map(|entry| entry.clone()))
    }

    async fn find_or_insert_directed(
        &self,
        entry: &Entry,
        now_ms: i64,
    ) -> RendezvousResult<DirectedSlot> {
        let pair = entry
            .pair_key()
            .ok_or_else(|| RendezvousError::Internal("expected a directed entry".to_string()))?;

        let mut state = self.lock();
        if let Some(existing) = state.live_directed(&pair, now_ms) {
            return Ok(DirectedSlot::Existing(existing.clone()));
        }
        state.reserve(&entry.code, now_ms)?;
        state.store(entry.clone());
        Ok(DirectedSlot::Created(entry.clone()))
    }

    async fn update<F>(&self, code: &Code, now_ms: i64, mutate: F) -> RendezvousResult<Entry>
    where
        F: FnOnce(&mut Entry) -> RendezvousResult<()> + Send,
    {
        let mut state = self.lock();
        let mut next = state
            .live(code, now_ms)
            .map(|entry| entry.clone())
            .ok_or(RendezvousError::NotFound)?;

        mutate(&mut next)?;
        next.code = code.clone();

        if let Some(pair) = next.pair_key() {
            if let Some(other) = state.directed.get(&pair).cloned() {
                if &other != code && state.live(&other, now_ms).is_some() {
                    return Err(RendezvousError::AlreadyExists);
                }
            }
        }

        state.take(code);
        state.store(next.clone());
        Ok(next)
    }

    async fn remove(&self, code: &Code) -> RendezvousResult<Option<Entry>> {
        Ok(self.lock().take(code))
    }

    async fn remove_if<P>(
        &self,
        code: &Code,
        now_ms: i64,
        predicate: P,
    ) -> RendezvousResult<Option<Entry>>
    where
        P: FnOnce(&Entry) -> bool + Send,
    {
        let mut state = self.lock();
        let matched = match state.live(code, now_ms) {
            Some(entry) => predicate(entry),
            None => return Ok(None),
        };
        Ok(if matched { state.take(code) } else { None })
    }

    async fn remove_directed(
        &self,
        pair: &PairKey,
        now_ms: i64,
    ) -> RendezvousResult<Option<Entry>> {
        let mut state = self.lock();
        let code = match state.live_directed(pair, now_ms) {
            Some(entry) => entry.code.clone(),
            None => return Ok(None),
        };
        Ok(state.take(&code))
    }

    async fn remove_expired_before(&self, now_ms: i64) -> RendezvousResult<u64> {
        let mut state = self.lock();
        let expired: Vec<Code> = state
            .entries
            .values()
            .filter(|entry| entry.is_expired(now_ms))
            .map(|entry| entry.code.clone())
            .collect();

        for code in &expired {
            state.take(code);
        }
        Ok(expired.len() as u64)
    }

    async fn count(&self) -> RendezvousResult<u64> {
        Ok(self.lock().entries.len() as u64)
    }
}

impl IdentityRepository for MemoryRendezvousRepository {
    async fn register(&self, identity: &Identity, _now_ms: i64) -> RendezvousResult<()> {
        if !self.lock().identities.insert(identity.clone()) {
            return Err(RendezvousError::AlreadyExists);
        }
        Ok(())
    }

    async fn exists(&self, identity: &Identity) -> RendezvousResult<bool> {
        Ok(self.lock().identities.contains(identity))
    }
}
