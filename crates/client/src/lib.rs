//! # Weft Client
//!
//! The transaction-submission protocol client: it builds and signs
//! proposals, collects endorsements across candidate peers with sequential
//! failover, assembles transaction and configuration envelopes, submits
//! them to the ordering service, and watches filtered-block streams for
//! commit outcomes.
//!
//! One logical operation runs on its own sequential call path; the only
//! background concurrency is the commit watcher's receive loop. Each call
//! opens and closes its own connections; nothing is pooled.

pub mod broadcast;
pub mod cache;
pub mod client;
pub mod connection;
pub mod deliver;
pub mod endorse;
pub mod envelope;
pub mod failover;
pub mod proposal;
pub mod signer;
pub mod watch;

pub use cache::IdentityCache;
pub use client::Client;
pub use deliver::BlockStream;
pub use endorse::Endorsed;
pub use signer::MspSigner;
