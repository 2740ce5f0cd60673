//! Client configuration.
//!
//! Timeouts and policy defaults for the protocol client, loadable from a
//! TOML file. Every field has a default so a missing or partial file still
//! yields a working configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default timeout for opening a connection when an endpoint sets none.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
/// Default timeout for endorsement, install, and instantiate calls.
pub const DEFAULT_ENDORSE_TIMEOUT: Duration = Duration::from_secs(5);
/// Default timeout for waiting on a transaction commit.
pub const DEFAULT_COMMIT_TIMEOUT: Duration = Duration::from_secs(20);

/// Timeout settings for the protocol client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment, in milliseconds.
    pub connect_ms: u64,
    /// Endorsement-class calls, in milliseconds.
    pub endorse_ms: u64,
    /// Commit wait, in milliseconds.
    pub commit_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: DEFAULT_CONNECT_TIMEOUT.as_millis() as u64,
            endorse_ms: DEFAULT_ENDORSE_TIMEOUT.as_millis() as u64,
            commit_ms: DEFAULT_COMMIT_TIMEOUT.as_millis() as u64,
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub fn endorse(&self) -> Duration {
        Duration::from_millis(self.endorse_ms)
    }

    pub fn commit(&self) -> Duration {
        Duration::from_millis(self.commit_ms)
    }
}

/// Top-level client configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Timeout settings.
    pub timeouts: TimeoutConfig,
}

impl ClientConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("reading {}: {e}", path.as_ref().display()))?;
        toml::from_str(&raw).map_err(|e| format!("parsing {}: {e}", path.as_ref().display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_timeouts() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.timeouts.connect(), Duration::from_secs(3));
        assert_eq!(cfg.timeouts.endorse(), Duration::from_secs(5));
        assert_eq!(cfg.timeouts.commit(), Duration::from_secs(20));
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let cfg: ClientConfig = toml::from_str("[timeouts]\nendorse_ms = 1500\n").unwrap();
        assert_eq!(cfg.timeouts.endorse(), Duration::from_millis(1500));
        assert_eq!(cfg.timeouts.commit(), Duration::from_secs(20));
    }
}
