//! Domain Value Objects
//!
//! Immutable value types for the rendezvous domain.

use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// Code
// ============================================================================

/// Short shared code correlating two parties
///
/// Ordering is lexicographic; the FIFO index uses it to break ties between
/// entries created in the same millisecond.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Code(String);

impl Code {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Code as typed by a client; surrounding whitespace is dropped
    pub fn from_input(input: &str) -> Self {
        Self(input.trim().to_string())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Identity
// ============================================================================

/// Maximum identity length (in characters, after normalization)
pub const IDENTITY_MAX_LENGTH: usize = 64;

/// Error returned when an identity fails validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Nothing left after trimming
    Empty,

    /// Longer than IDENTITY_MAX_LENGTH
    TooLong { length: usize, max: usize },

    /// Whitespace or control character inside the handle
    InvalidCharacter { char: char, position: usize },
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Identity cannot be empty"),
            Self::TooLong { length, max } => {
                write!(f, "Identity is too long ({length} chars, maximum {max})")
            }
            Self::InvalidCharacter { char, position } => {
                write!(f, "Invalid character {char:?} at position {position}")
            }
        }
    }
}

impl std::error::Error for IdentityError {}

/// Opaque caller-supplied handle
///
/// # Invariants
/// - NFKC normalized and trimmed
/// - 1..=IDENTITY_MAX_LENGTH characters
/// - No whitespace or control characters
///
/// Case is preserved; `Alice` and `alice` are different identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    pub fn new(input: impl AsRef<str>) -> Result<Self, IdentityError> {
        let normalized = input.as_ref().nfkc().collect::<String>().trim().to_string();
        Self::validate(&normalized)?;
        Ok(Self(normalized))
    }

    /// Rebuild from storage (already validated on the way in)
    pub fn from_db(value: String) -> Self {
        Self(value)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(normalized: &str) -> Result<(), IdentityError> {
        if normalized.is_empty() {
            return Err(IdentityError::Empty);
        }

        let length = normalized.chars().count();
        if length > IDENTITY_MAX_LENGTH {
            return Err(IdentityError::TooLong {
                length,
                max: IDENTITY_MAX_LENGTH,
            });
        }

        if let Some((position, char)) = normalized
            .chars()
            .enumerate()
            .find(|(_, c)| c.is_whitespace() || c.is_control())
        {
            return Err(IdentityError::InvalidCharacter { char, position });
        }

        Ok(())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

// ============================================================================
// PairKey
// ============================================================================

/// Unordered pair of identities
///
/// `PairKey::new(a, b) == PairKey::new(b, a)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey {
    low: Identity,
    high: Identity,
}

impl PairKey {
    pub fn new(a: Identity, b: Identity) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> &Identity {
        &self.low
    }

    pub fn high(&self) -> &Identity {
        &self.high
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        &self.low == identity || &self.high == identity
    }
}

// ============================================================================
// SlotStatus
// ============================================================================

/// State of an anonymous slot as seen by a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    /// One party joined, waiting for the second
    Waiting,
    /// Two parties met on this code; terminal
    Paired,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Waiting => "waiting",
            SlotStatus::Paired => "paired",
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
