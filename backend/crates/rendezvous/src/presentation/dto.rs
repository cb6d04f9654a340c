//! API DTOs (Data Transfer Objects)

use crate::domain::entities::{Entry, EntryKind};
use crate::domain::value_objects::{Code, Identity, SlotStatus};
use serde::{Deserialize, Serialize};

/// Response for POST /slots
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse {
    pub code: Code,
    pub status: SlotStatus,
    pub expires_at_ms: i64,
}

/// Request for POST /identities
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterIdentityRequest {
    pub name: String,
}

/// Request for POST /requests, /requests/accept and /requests/cancel
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairRequest {
    pub sender: String,
    pub receiver: String,
}

/// Response for POST /requests and /requests/accept
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectedCodeResponse {
    pub code: Code,
    pub expires_at_ms: i64,
}

/// Response for GET /codes/{code}
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LookupResponse {
    #[serde(rename_all = "camelCase")]
    Anonymous {
        code: Code,
        status: SlotStatus,
        created_at_ms: i64,
        expires_at_ms: i64,
    },
    #[serde(rename_all = "camelCase")]
    Directed {
        code: Code,
        sender: Identity,
        receiver: Identity,
        accepted: bool,
        created_at_ms: i64,
        expires_at_ms: i64,
    },
}

impl From<Entry> for LookupResponse {
    fn from(entry: Entry) -> Self {
        let status = entry.slot_status();
        match entry.kind {
            EntryKind::Anonymous { .. } => LookupResponse::Anonymous {
                code: entry.code,
                status: status.unwrap_or(SlotStatus::Waiting),
                created_at_ms: entry.created_at_ms,
                expires_at_ms: entry.expires_at_ms,
            },
            EntryKind::Directed {
                sender,
                receiver,
                accepted,
            } => LookupResponse::Directed {
                code: entry.code,
                sender,
                receiver,
                accepted,
                created_at_ms: entry.created_at_ms,
                expires_at_ms: entry.expires_at_ms,
            },
        }
    }
}

/// Response for GET /payload
#[derive(Debug, Clone, Serialize)]
pub struct PayloadResponse {
    pub payload: String,
}

/// Empty JSON object body
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmptyResponse {}
