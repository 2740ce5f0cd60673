#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo
    )
)]

//! # Weft Telemetry
//!
//! Structured logging initialization for binaries and long-lived clients
//! embedding the Weft stack.

/// The initialization routine for global structured logging.
pub mod init;

pub use init::init_tracing;
