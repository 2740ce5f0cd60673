//! # Weft Types
//!
//! Core types shared by every crate of the Weft ledger client: network
//! endpoints, the signing-identity contract, the operator-facing identity
//! bundle, client configuration, and the error taxonomy.

pub mod bundle;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod identity;

pub use endpoint::Endpoint;

/// Name of the ordering-system channel that carries consortium membership.
pub const DEFAULT_SYSTEM_CHANNEL: &str = "systemchain";

/// Name of the consortium new application channels are created under.
pub const DEFAULT_CONSORTIUM: &str = "defaultConsortium";
