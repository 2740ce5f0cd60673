//! # Weft Test Utils
//!
//! In-process peer and orderer gRPC services for integration tests, plus
//! identity fixtures. Tests run against live `tonic` servers bound to
//! ephemeral loopback ports rather than hand-rolled fakes.

pub mod identity;
pub mod mock;

pub use identity::test_signer;
pub use mock::{
    spawn_orderer, spawn_peer, tx_id_of, unreachable_endpoint, DeliverState, MockEndorser,
    MockOrderer, MockPeerDeliver, MockServer,
};
