//! Domain Services
//!
//! Code generation. Uniqueness is not checked here; the registry rejects
//! duplicates and code issuance retries.

use crate::domain::value_objects::Code;
use crate::error::{RendezvousError, RendezvousResult};
use rand::Rng;
use std::collections::HashSet;

/// Uppercase letters and digits, the default code alphabet
pub const UPPERCASE_ALPHANUMERIC: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Mixed-case letters and digits, used for free-standing payloads
pub const MIXED_ALPHANUMERIC: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Payload length served by the payload endpoint
pub const PAYLOAD_LENGTH: usize = 8;

/// Smallest code space accepted at startup
pub const MIN_CODE_SPACE: u128 = 1_000_000;

pub const MIN_ALPHABET_LEN: usize = 2;
pub const MAX_ALPHABET_LEN: usize = 128;
pub const MAX_CODE_LENGTH: usize = 64;

/// Fixed-length codes drawn uniformly from an alphabet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeGenerator {
    alphabet: Vec<u8>,
    length: usize,
}

impl CodeGenerator {
    /// Validate the alphabet and length
    ///
    /// The alphabet must hold MIN_ALPHABET_LEN..=MAX_ALPHABET_LEN distinct
    /// printable ASCII characters.
    pub fn new(alphabet: &str, length: usize) -> RendezvousResult<Self> {
        let bytes = alphabet.as_bytes();

        if !(MIN_ALPHABET_LEN..=MAX_ALPHABET_LEN).contains(&bytes.len()) {
            return Err(RendezvousError::Configuration(format!(
                "alphabet must have {MIN_ALPHABET_LEN}..={MAX_ALPHABET_LEN} characters, got {}",
                bytes.len()
            )));
        }
        if let Some(bad) = alphabet.chars().find(|c| !c.is_ascii_graphic()) {
            return Err(RendezvousError::Configuration(format!(
                "alphabet must be printable ASCII, found {bad:?}"
            )));
        }
        let distinct: HashSet<u8> = bytes.iter().copied().collect();
        if distinct.len() != bytes.len() {
            return Err(RendezvousError::Configuration(
                "alphabet contains repeated characters".to_string(),
            ));
        }
        if !(1..=MAX_CODE_LENGTH).contains(&length) {
            return Err(RendezvousError::Configuration(format!(
                "code length must be 1..={MAX_CODE_LENGTH}, got {length}"
            )));
        }

        Ok(Self {
            alphabet: bytes.to_vec(),
            length,
        })
    }

    /// Generator for the free-standing payload endpoint
    pub fn payload() -> Self {
        Self {
            alphabet: MIXED_ALPHANUMERIC.as_bytes().to_vec(),
            length: PAYLOAD_LENGTH,
        }
    }

    pub fn generate(&self) -> Code {
        Code::new(platform::random::random_string(&self.alphabet, self.length))
    }

    pub fn generate_with<R>(&self, rng: &mut R) -> Code
    where
        R: Rng + ?Sized,
    {
        Code::new(platform::random::random_string_with(
            rng,
            &self.alphabet,
            self.length,
        ))
    }

    /// Number of distinct codes, saturating at `u128::MAX`
    pub fn code_space(&self) -> u128 {
        u32::try_from(self.length)
            .ok()
            .and_then(|len| (self.alphabet.len() as u128).checked_pow(len))
            .unwrap_or(u128::MAX)
    }

    /// Reject configurations whose code space is too small to avoid collisions
    pub fn ensure_code_space(&self, min: u128) -> RendezvousResult<()> {
        let space = self.code_space();
        if space < min {
            return Err(RendezvousError::Configuration(format!(
                "code space {space} is below the minimum {min}; use a longer code or larger alphabet"
            )));
        }
        Ok(())
    }

    /// Could this generator have produced `code`?
    pub fn matches(&self, code: &Code) -> bool {
        code.as_str().len() == self.length
            && code.as_str().bytes().all(|b| self.alphabet.contains(&b))
    }

    pub fn alphabet(&self) -> &[u8] {
        &self.alphabet
    }

    pub fn length(&self) -> usize {
        self.length
    }
}
