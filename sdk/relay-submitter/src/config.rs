use crate::core::constants::{
    CHUNK_SIZE, DEFAULT_RPC_URL, DEFAULT_SLOT_POLL_INTERVAL_MS, DEFAULT_SLOT_WAIT_TIMEOUT_SECS,
    DEFAULT_STATUS_TIMEOUT_SECS, DEFAULT_TX_TIMEOUT_SECS, MAX_COMPUTE_UNITS,
};
use crate::error::{Result, SubmitterError};
use crate::types::ConfirmationLevel;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Timeouts, commitment and sizing used by a [`crate::Submitter`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SubmitterConfig {
    pub rpc_url: String,

    /// Level every transaction is driven to and the commitment blockhashes are read at
    pub commitment: ConfirmationLevel,

    /// Budget of the broadcast loop, in whole seconds
    pub tx_timeout_secs: u64,

    /// Ceiling for a standalone status wait
    pub status_timeout_secs: u64,

    pub slot_poll_interval_ms: u64,
    pub slot_wait_timeout_secs: u64,
    pub chunk_size: usize,

    /// Limit requested for misbehaviour assembly
    pub assembly_compute_units: u32,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            commitment: ConfirmationLevel::Confirmed,
            tx_timeout_secs: DEFAULT_TX_TIMEOUT_SECS,
            status_timeout_secs: DEFAULT_STATUS_TIMEOUT_SECS,
            slot_poll_interval_ms: DEFAULT_SLOT_POLL_INTERVAL_MS,
            slot_wait_timeout_secs: DEFAULT_SLOT_WAIT_TIMEOUT_SECS,
            chunk_size: CHUNK_SIZE,
            assembly_compute_units: MAX_COMPUTE_UNITS,
        }
    }
}

impl SubmitterConfig {
    /// Defaults overridden from the environment, see [`Self::with_env_overrides`].
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Read a JSON config file. Fields left out keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| SubmitterError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| SubmitterError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `RPC_URL`, `COMMITMENT`, `TX_TIMEOUT_SECS`, `STATUS_TIMEOUT_SECS`,
    /// `SLOT_POLL_INTERVAL_MS`, `SLOT_WAIT_TIMEOUT_SECS`, `CHUNK_SIZE` and
    /// `ASSEMBLY_COMPUTE_UNITS` on top of `self`.
    pub fn with_env_overrides(self) -> Result<Self> {
        let mut config = self;

        if let Ok(url) = env::var("RPC_URL") {
            config.rpc_url = url;
        }
        if let Some(commitment) = parse_var::<ConfirmationLevel>("COMMITMENT")? {
            config.commitment = commitment;
        }
        if let Some(secs) = parse_var("TX_TIMEOUT_SECS")? {
            config.tx_timeout_secs = secs;
        }
        if let Some(secs) = parse_var("STATUS_TIMEOUT_SECS")? {
            config.status_timeout_secs = secs;
        }
        if let Some(ms) = parse_var("SLOT_POLL_INTERVAL_MS")? {
            config.slot_poll_interval_ms = ms;
        }
        if let Some(secs) = parse_var("SLOT_WAIT_TIMEOUT_SECS")? {
            config.slot_wait_timeout_secs = secs;
        }
        if let Some(size) = parse_var("CHUNK_SIZE")? {
            config.chunk_size = size;
        }
        if let Some(units) = parse_var("ASSEMBLY_COMPUTE_UNITS")? {
            config.assembly_compute_units = units;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(SubmitterError::Config("chunk_size must be positive".into()));
        }
        if self.tx_timeout_secs == 0 {
            return Err(SubmitterError::Config("tx_timeout_secs must be positive".into()));
        }
        if self.assembly_compute_units > MAX_COMPUTE_UNITS {
            return Err(SubmitterError::Config(format!(
                "assembly_compute_units exceeds {}",
                MAX_COMPUTE_UNITS
            )));
        }
        Ok(())
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout_secs)
    }

    pub fn slot_poll_interval(&self) -> Duration {
        Duration::from_millis(self.slot_poll_interval_ms)
    }

    pub fn slot_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.slot_wait_timeout_secs)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| SubmitterError::Config(format!("{}: {}", name, e))),
        Err(_) => Ok(None),
    }
}
