//! # Weft Crypto
//!
//! Signing, hashing, and nonce generation for the protocol client, built
//! on `dcrypt` primitives.

pub mod error;
pub mod hash;
pub mod nonce;
pub mod sign;

pub use error::CryptoError;
pub use hash::sha256;
pub use nonce::random_nonce;
pub use sign::eddsa::Ed25519KeyPair;
pub use sign::SignatureSuite;
