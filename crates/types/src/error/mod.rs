//! Error taxonomy for the Weft client.
//!
//! Each failure domain gets its own enum. Connectivity failures are
//! recovered locally by endpoint failover and only surface once a whole
//! candidate list is exhausted; validation and consensus-mismatch failures
//! surface immediately and are never retried.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// A single endpoint could not be reached or negotiated.
#[derive(Error, Debug)]
pub enum ConnectivityError {
    /// The endpoint address could not be parsed into a URI.
    #[error("Invalid endpoint address '{0}': {1}")]
    InvalidAddress(String, String),
    /// The TLS trust anchor or server name could not be applied.
    #[error("TLS configuration rejected for '{0}': {1}")]
    Tls(String, String),
    /// The transport-level connection failed or timed out.
    #[error("Failed connecting to '{0}': {1}")]
    Connect(String, String),
}

impl ErrorCode for ConnectivityError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidAddress(..) => "CONN_INVALID_ADDRESS",
            Self::Tls(..) => "CONN_TLS",
            Self::Connect(..) => "CONN_CONNECT",
        }
    }
}

/// Errors collecting endorsements for a proposal.
#[derive(Error, Debug)]
pub enum EndorseError {
    /// The proposal could not be constructed or signed.
    #[error("Failed building proposal: {0}")]
    Build(String),
    /// The candidate endpoint could not be reached.
    #[error(transparent)]
    Connectivity(#[from] ConnectivityError),
    /// The RPC itself failed after the connection was established.
    #[error("Proposal RPC to '{0}' failed: {1}")]
    Rpc(String, String),
    /// The peer answered with a non-success response status.
    #[error("Proposal rejected with status {status}: {message}")]
    BadStatus {
        /// Status code carried in the peer's response.
        status: i32,
        /// Human-readable message from the peer.
        message: String,
    },
    /// The response is structurally incomplete (missing response body,
    /// endorsement, or signature).
    #[error("Malformed proposal response: missing {0}")]
    MissingField(&'static str),
    /// Two successful endorsers returned divergent payload bytes for the
    /// same proposal. Signals non-determinism or tampering; fatal, never
    /// retried, and never resolved by picking one side.
    #[error("Endorsement payloads do not match across endorsers")]
    PayloadMismatch,
    /// Every candidate endorser failed.
    #[error("All {attempts} endorser(s) failed; last error: {last}")]
    AllEndpointsFailed {
        /// Number of candidates tried.
        attempts: usize,
        /// The last per-endpoint error observed.
        last: String,
    },
}

impl ErrorCode for EndorseError {
    fn code(&self) -> &'static str {
        match self {
            Self::Build(_) => "ENDORSE_BUILD",
            Self::Connectivity(e) => e.code(),
            Self::Rpc(..) => "ENDORSE_RPC",
            Self::BadStatus { .. } => "ENDORSE_BAD_STATUS",
            Self::MissingField(_) => "ENDORSE_MALFORMED_RESPONSE",
            Self::PayloadMismatch => "ENDORSE_PAYLOAD_MISMATCH",
            Self::AllEndpointsFailed { .. } => "ENDORSE_ALL_ENDPOINTS_FAILED",
        }
    }
}

/// Errors submitting an envelope to the ordering service.
#[derive(Error, Debug)]
pub enum BroadcastError {
    /// The candidate endpoint could not be reached.
    #[error(transparent)]
    Connectivity(#[from] ConnectivityError),
    /// The broadcast stream failed before an acknowledgment arrived.
    #[error("Broadcast stream to '{0}' failed: {1}")]
    Rpc(String, String),
    /// The orderer refused the envelope.
    #[error("Envelope rejected with status {status}: {info}")]
    Rejected {
        /// Status code returned on the broadcast stream.
        status: i32,
        /// Additional information from the orderer.
        info: String,
    },
    /// The stream ended without any acknowledgment.
    #[error("Broadcast stream closed before acknowledgment")]
    NoAck,
    /// Every candidate orderer failed.
    #[error("All {attempts} orderer(s) failed; last error: {last}")]
    AllEndpointsFailed {
        /// Number of candidates tried.
        attempts: usize,
        /// The last per-endpoint error observed.
        last: String,
    },
}

impl ErrorCode for BroadcastError {
    fn code(&self) -> &'static str {
        match self {
            Self::Connectivity(e) => e.code(),
            Self::Rpc(..) => "BROADCAST_RPC",
            Self::Rejected { .. } => "BROADCAST_REJECTED",
            Self::NoAck => "BROADCAST_NO_ACK",
            Self::AllEndpointsFailed { .. } => "BROADCAST_ALL_ENDPOINTS_FAILED",
        }
    }
}

/// Errors delivering blocks or waiting for a transaction to commit.
#[derive(Error, Debug)]
pub enum WatchError {
    /// The delivering endpoint could not be reached.
    #[error(transparent)]
    Connectivity(#[from] ConnectivityError),
    /// The deliver stream failed.
    #[error("Deliver stream failed: {0}")]
    Stream(String),
    /// The peer answered the seek request with a non-success status.
    #[error("Deliver request refused with status {0}")]
    BadStatus(i32),
    /// The stream ended before the requested data arrived.
    #[error("Deliver stream ended unexpectedly")]
    StreamEnded,
    /// The stream was closed locally while a read was pending.
    #[error("Block stream is closed")]
    Closed,
    /// The watched transaction did not appear before the deadline. The
    /// transaction may still commit later; callers must treat this as
    /// "unknown", not "failed".
    #[error("Timed out waiting for transaction commit")]
    Timeout,
    /// Every candidate delivering endpoint failed.
    #[error("All {attempts} endpoint(s) failed; last error: {last}")]
    AllEndpointsFailed {
        /// Number of candidates tried.
        attempts: usize,
        /// The last per-endpoint error observed.
        last: String,
    },
}

impl ErrorCode for WatchError {
    fn code(&self) -> &'static str {
        match self {
            Self::Connectivity(e) => e.code(),
            Self::Stream(_) => "WATCH_STREAM",
            Self::BadStatus(_) => "WATCH_BAD_STATUS",
            Self::StreamEnded => "WATCH_STREAM_ENDED",
            Self::Closed => "WATCH_CLOSED",
            Self::Timeout => "WATCH_TIMEOUT",
            Self::AllEndpointsFailed { .. } => "WATCH_ALL_ENDPOINTS_FAILED",
        }
    }
}

/// Errors materializing or using a signing identity.
#[derive(Error, Debug)]
pub enum IdentityError {
    /// Reading certificate or key material from disk failed.
    #[error("Failed reading identity material from '{path}': {source}")]
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The private key bytes are not a valid key.
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),
    /// Producing a signature failed.
    #[error("Signing failed: {0}")]
    Sign(String),
}

impl ErrorCode for IdentityError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "IDENTITY_IO",
            Self::InvalidKey(_) => "IDENTITY_INVALID_KEY",
            Self::Sign(_) => "IDENTITY_SIGN",
        }
    }
}

/// Errors computing or encoding configuration updates.
#[derive(Error, Debug)]
pub enum ConfigTxError {
    /// A wire structure could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
    /// The configuration tree is missing a group the operation requires.
    #[error("Configuration has no '{0}' group")]
    MissingGroup(String),
    /// The configuration tree is missing a value the operation requires.
    #[error("Configuration has no '{0}' value")]
    MissingValue(String),
    /// The block does not carry the expected configuration envelope.
    #[error("Not a configuration block: {0}")]
    NotAConfigBlock(String),
    /// Signing the update failed.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl ErrorCode for ConfigTxError {
    fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "CONFIGTX_DECODE",
            Self::MissingGroup(_) => "CONFIGTX_MISSING_GROUP",
            Self::MissingValue(_) => "CONFIGTX_MISSING_VALUE",
            Self::NotAConfigBlock(_) => "CONFIGTX_NOT_A_CONFIG_BLOCK",
            Self::Identity(e) => e.code(),
        }
    }
}

/// Top-level errors from orchestrated operations.
///
/// Every orchestrator call returns either success or exactly one of these;
/// partial progress is carried in dedicated variants so operators can
/// resume instead of blindly retrying.
#[derive(Error, Debug)]
pub enum OrchestrationError {
    /// Endorsement phase failed.
    #[error(transparent)]
    Endorse(#[from] EndorseError),
    /// Broadcast phase failed.
    #[error(transparent)]
    Broadcast(#[from] BroadcastError),
    /// Commit watch or block delivery failed.
    #[error(transparent)]
    Watch(#[from] WatchError),
    /// Configuration update computation or signing failed.
    #[error(transparent)]
    ConfigTx(#[from] ConfigTxError),
    /// Identity materialization or signing failed.
    #[error(transparent)]
    Identity(#[from] IdentityError),
    /// The transaction was ordered but committed as invalid.
    #[error("Transaction '{0}' committed as invalid")]
    InvalidTransaction(String),
    /// The application-channel update failed *after* the system-channel
    /// update was accepted. The topology change is half applied; resume
    /// with the application channel only.
    #[error(
        "Application channel '{channel}' update failed after the system \
         channel update was accepted: {source}"
    )]
    AppChannelUpdate {
        /// The application channel whose update is still outstanding.
        channel: String,
        /// The failure that interrupted the second update.
        source: Box<OrchestrationError>,
    },
    /// The identity bundle could not be parsed.
    #[error("Invalid identity bundle: {0}")]
    InvalidBundle(String),
    /// An argument precondition was violated.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ErrorCode for OrchestrationError {
    fn code(&self) -> &'static str {
        match self {
            Self::Endorse(e) => e.code(),
            Self::Broadcast(e) => e.code(),
            Self::Watch(e) => e.code(),
            Self::ConfigTx(e) => e.code(),
            Self::Identity(e) => e.code(),
            Self::InvalidTransaction(_) => "ORCH_INVALID_TRANSACTION",
            Self::AppChannelUpdate { .. } => "ORCH_APP_CHANNEL_UPDATE",
            Self::InvalidBundle(_) => "ORCH_INVALID_BUNDLE",
            Self::InvalidArgument(_) => "ORCH_INVALID_ARGUMENT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_governance_failure_is_distinct() {
        let inner = OrchestrationError::Broadcast(BroadcastError::NoAck);
        let err = OrchestrationError::AppChannelUpdate {
            channel: "trades".into(),
            source: Box::new(inner),
        };
        assert_eq!(err.code(), "ORCH_APP_CHANNEL_UPDATE");
        let msg = err.to_string();
        assert!(msg.contains("trades"));
        assert!(msg.contains("system channel update was accepted"));
    }

    #[test]
    fn mismatch_code_differs_from_connectivity() {
        let mismatch = EndorseError::PayloadMismatch;
        let conn = EndorseError::Connectivity(ConnectivityError::Connect(
            "peer0:7051".into(),
            "refused".into(),
        ));
        assert_ne!(mismatch.code(), conn.code());
    }
}
