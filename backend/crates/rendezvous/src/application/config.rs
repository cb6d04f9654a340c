//! Application Configuration
//!
//! Configuration for the rendezvous application layer.

use crate::domain::services::{CodeGenerator, MIN_CODE_SPACE, UPPERCASE_ALPHANUMERIC};
use crate::error::{RendezvousError, RendezvousResult};
use std::time::Duration;

/// Rendezvous application configuration
#[derive(Debug, Clone)]
pub struct RendezvousConfig {
    /// Characters codes are drawn from
    pub alphabet: String,
    /// Characters per code
    pub code_length: usize,
    /// Anonymous slot TTL
    pub anonymous_ttl: Duration,
    /// Directed request TTL
    pub directed_ttl: Duration,
    /// Generate + insert attempts before giving up on a fresh code
    pub max_generation_attempts: u32,
    /// Period of the background sweep
    pub reap_interval: Duration,
}

impl Default for RendezvousConfig {
    fn default() -> Self {
        Self {
            alphabet: UPPERCASE_ALPHANUMERIC.to_string(),
            code_length: 6,
            anonymous_ttl: Duration::from_secs(120),
            directed_ttl: Duration::from_secs(3 * 24 * 60 * 60),
            max_generation_attempts: 8,
            reap_interval: Duration::from_secs(30),
        }
    }
}

impl RendezvousConfig {
    /// Startup sanity check
    ///
    /// Rejects alphabets and lengths whose code space is too small to
    /// realistically avoid collisions, so the retry loop never has to.
    pub fn validate(&self) -> RendezvousResult<()> {
        self.generator()?.ensure_code_space(MIN_CODE_SPACE)?;

        if self.max_generation_attempts == 0 {
            return Err(RendezvousError::Configuration(
                "max_generation_attempts must be at least 1".to_string(),
            ));
        }
        if self.anonymous_ttl_ms() <= 0 || self.directed_ttl_ms() <= 0 {
            return Err(RendezvousError::Configuration(
                "TTLs must be at least one millisecond".to_string(),
            ));
        }
        if self.reap_interval.is_zero() {
            return Err(RendezvousError::Configuration(
                "reap_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn generator(&self) -> RendezvousResult<CodeGenerator> {
        CodeGenerator::new(&self.alphabet, self.code_length)
    }

    pub fn anonymous_ttl_ms(&self) -> i64 {
        duration_ms(self.anonymous_ttl)
    }

    pub fn directed_ttl_ms(&self) -> i64 {
        duration_ms(self.directed_ttl)
    }
}

fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
