//! Bridge configuration parsing and validation.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{BridgeError, Result};

fn default_host() -> String {
    "localhost".into()
}

fn default_port() -> u16 {
    3030
}

fn default_chunk_size() -> usize {
    8192
}

fn default_timeout_seconds() -> u64 {
    15
}

/// Bridge configuration parsed from `config.toml`.
///
/// Every field carries a default, so an empty file (or no file at all, via
/// [`BridgeConfig::default`]) yields a configuration pointing at a local
/// peer on the standard port.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BridgeConfig {
    /// Host name or address of the audio-execution peer.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port the peer listens on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum bytes requested per read while receiving a response.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Per-command deadline in seconds, bounding the connect attempt, the
    /// envelope write, and the response read.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            chunk_size: default_chunk_size(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl BridgeConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| BridgeError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Per-command deadline as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(BridgeError::Config("host must not be empty".into()));
        }

        if self.chunk_size == 0 {
            return Err(BridgeError::Config(
                "chunk_size must be greater than zero".into(),
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(BridgeError::Config(
                "timeout_seconds must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
