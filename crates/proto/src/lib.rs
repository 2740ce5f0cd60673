//! # Weft Protocol
//!
//! Generated protobuf messages and gRPC service stubs for the peer and
//! orderer surfaces: proposal, proposal-response, envelope, block,
//! filtered-block, and the channel-configuration tree.

// Packages are nested inside `v1` modules so that `super::super::...`
// references between generated packages resolve correctly.
pub mod common {
    pub mod v1 {
        tonic::include_proto!("weft.common.v1");
    }
    pub use v1::*;
}

pub mod peer {
    pub mod v1 {
        tonic::include_proto!("weft.peer.v1");
    }
    pub use v1::*;
}

pub mod orderer {
    pub mod v1 {
        tonic::include_proto!("weft.orderer.v1");
    }
    pub use v1::*;
}

/// Serializes a message to its wire bytes.
pub fn encode<M: prost::Message>(message: &M) -> Vec<u8> {
    message.encode_to_vec()
}

/// Decodes a message from wire bytes, reporting the failing type on error.
pub fn decode<M: prost::Message + Default>(bytes: &[u8]) -> Result<M, String> {
    M::decode(bytes).map_err(|e| format!("decoding {}: {e}", std::any::type_name::<M>()))
}

/// Index of the last-config pointer in a block's metadata slots.
pub const BLOCK_METADATA_LAST_CONFIG: usize = 1;
