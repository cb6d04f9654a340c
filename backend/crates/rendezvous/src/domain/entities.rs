//! Domain Entities
//!
//! The registry record and its two variants.

use crate::domain::value_objects::{Code, Identity, PairKey, SlotStatus};
use crate::error::{RendezvousError, RendezvousResult};

/// Parties on a freshly created anonymous slot
pub const PARTIES_WAITING: u8 = 1;
/// Parties once the slot has been claimed
pub const PARTIES_PAIRED: u8 = 2;

/// What an entry is for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// First-come-first-served slot; `parties` goes 1 -> 2 exactly once
    Anonymous { parties: u8 },
    /// Named sender -> receiver request
    Directed {
        sender: Identity,
        receiver: Identity,
        accepted: bool,
    },
}

/// Registry record for one live code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub code: Code,
    pub kind: EntryKind,
    pub created_at_ms: i64,
    pub expires_at_ms: i64,
}

impl Entry {
    /// New anonymous slot with one waiting party
    pub fn anonymous(code: Code, now_ms: i64, ttl_ms: i64) -> Self {
        Self {
            code,
            kind: EntryKind::Anonymous {
                parties: PARTIES_WAITING,
            },
            created_at_ms: now_ms,
            expires_at_ms: now_ms.saturating_add(ttl_ms),
        }
    }

    /// New unaccepted directed request
    pub fn directed(
        code: Code,
        sender: Identity,
        receiver: Identity,
        now_ms: i64,
        ttl_ms: i64,
    ) -> Self {
        Self {
            code,
            kind: EntryKind::Directed {
                sender,
                receiver,
                accepted: false,
            },
            created_at_ms: now_ms,
            expires_at_ms: now_ms.saturating_add(ttl_ms),
        }
    }

    /// Live entries may be returned; everything else is treated as absent
    #[inline]
    pub fn is_live(&self, now_ms: i64) -> bool {
        self.expires_at_ms > now_ms
    }

    #[inline]
    pub fn is_expired(&self, now_ms: i64) -> bool {
        !self.is_live(now_ms)
    }

    /// Anonymous slot still looking for its second party
    pub fn is_waiting(&self) -> bool {
        matches!(
            self.kind,
            EntryKind::Anonymous {
                parties: PARTIES_WAITING
            }
        )
    }

    pub fn slot_status(&self) -> Option<SlotStatus> {
        match self.kind {
            EntryKind::Anonymous { parties } if parties >= PARTIES_PAIRED => {
                Some(SlotStatus::Paired)
            }
            EntryKind::Anonymous { .. } => Some(SlotStatus::Waiting),
            EntryKind::Directed { .. } => None,
        }
    }

    pub fn pair_key(&self) -> Option<PairKey> {
        match &self.kind {
            EntryKind::Directed {
                sender, receiver, ..
            } => Some(PairKey::new(sender.clone(), receiver.clone())),
            EntryKind::Anonymous { .. } => None,
        }
    }

    /// Second party joins the slot (1 -> 2)
    ///
    /// Anything other than a waiting slot is `NotFound` to the caller.
    pub fn claim(&mut self) -> RendezvousResult<()> {
        match &mut self.kind {
            EntryKind::Anonymous { parties } if *parties == PARTIES_WAITING => {
                *parties = PARTIES_PAIRED;
                Ok(())
            }
            _ => Err(RendezvousError::NotFound),
        }
    }

    /// Receiver accepts the request; idempotent
    ///
    /// Fails with `NotFound` unless this is the directed entry for `pair`.
    pub fn accept(&mut self, pair: &PairKey) -> RendezvousResult<()> {
        if self.pair_key().as_ref() != Some(pair) {
            return Err(RendezvousError::NotFound);
        }
        if let EntryKind::Directed { accepted, .. } = &mut self.kind {
            *accepted = true;
        }
        Ok(())
    }
}
