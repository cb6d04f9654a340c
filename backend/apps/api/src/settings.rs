//! Server Settings
//!
//! Everything the binary reads from the environment (after `.env`).

use anyhow::{Context, bail};
use rendezvous::RendezvousConfig;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9000";

/// Which registry backs the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Memory,
    Postgres,
}

impl FromStr for Storage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Storage::Memory),
            "postgres" | "postgresql" => Ok(Storage::Postgres),
            other => bail!("unknown RENDEZVOUS_STORAGE {other:?} (expected memory or postgres)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub storage: Storage,
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    /// Empty means any origin
    pub frontend_origins: Vec<String>,
    pub rendezvous: RendezvousConfig,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = RendezvousConfig::default();

        let storage = match lookup("RENDEZVOUS_STORAGE") {
            Some(value) => value.parse()?,
            None => Storage::Memory,
        };
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if storage == Storage::Postgres && database_url.is_none() {
            bail!("DATABASE_URL must be set when RENDEZVOUS_STORAGE=postgres");
        }

        let rendezvous = RendezvousConfig {
            alphabet: lookup("CODE_ALPHABET").unwrap_or(defaults.alphabet),
            code_length: parse_or(&lookup, "CODE_LENGTH", defaults.code_length)?,
            anonymous_ttl: secs_or(&lookup, "SLOT_TTL_SECS", defaults.anonymous_ttl)?,
            directed_ttl: secs_or(&lookup, "REQUEST_TTL_SECS", defaults.directed_ttl)?,
            max_generation_attempts: parse_or(
                &lookup,
                "CODE_MAX_ATTEMPTS",
                defaults.max_generation_attempts,
            )?,
            reap_interval: secs_or(&lookup, "REAP_INTERVAL_SECS", defaults.reap_interval)?,
        };
        rendezvous.validate()?;

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be host:port")?;

        let frontend_origins = lookup("FRONTEND_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty() && *origin != "*")
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            storage,
            database_url,
            bind_addr,
            frontend_origins,
            rendezvous,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value {value:?}")),
        None => Ok(default),
    }
}

fn secs_or<F>(lookup: &F, key: &str, default: Duration) -> anyhow::Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(_) => parse_or(lookup, key, 0u64).map(Duration::from_secs),
        None => Ok(default),
    }
}
