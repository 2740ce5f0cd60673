//! Network endpoint description for peers and ordering nodes.

use std::time::Duration;

/// A single reachable network target.
///
/// An `Endpoint` is an immutable value constructed per call from an
/// organization's node list; connections built from it are not pooled or
/// shared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// `host:port` of the node.
    pub address: String,
    /// TLS server-name override, when the certificate CN does not match
    /// the dialed address.
    pub sni_override: Option<String>,
    /// PEM-encoded trust-anchor certificate. `None` connects without
    /// transport security (test setups only).
    pub tls_ca: Option<Vec<u8>>,
    /// Per-connection timeout. Falls back to the client default when unset.
    pub timeout: Option<Duration>,
}

impl Endpoint {
    /// Plaintext endpoint with default timeout.
    pub fn insecure(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            sni_override: None,
            tls_ca: None,
            timeout: None,
        }
    }

    /// TLS endpoint pinned to the given PEM trust anchor.
    pub fn tls(address: impl Into<String>, tls_ca: impl Into<Vec<u8>>) -> Self {
        Self {
            address: address.into(),
            sni_override: None,
            tls_ca: Some(tls_ca.into()),
            timeout: None,
        }
    }

    /// Returns a copy with the given timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns a copy with the given SNI override.
    pub fn with_sni_override(mut self, name: impl Into<String>) -> Self {
        self.sni_override = Some(name.into());
        self
    }
}
