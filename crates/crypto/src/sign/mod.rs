pub mod eddsa;

use crate::error::CryptoError;
use eddsa::Ed25519KeyPair;

/// The closed set of supported signature algorithms.
///
/// Dispatch is by explicit tag; adding an algorithm means adding a variant
/// and covering the new arm in every match below.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum SignatureSuite {
    Ed25519,
}

impl SignatureSuite {
    /// Generates a fresh key pair for this suite.
    pub fn generate(&self) -> Result<Ed25519KeyPair, CryptoError> {
        match self {
            SignatureSuite::Ed25519 => Ed25519KeyPair::generate(),
        }
    }

    /// Reconstructs a key pair from stored seed bytes.
    pub fn keypair_from_seed(&self, seed: &[u8]) -> Result<Ed25519KeyPair, CryptoError> {
        match self {
            SignatureSuite::Ed25519 => Ed25519KeyPair::from_seed(seed),
        }
    }
}

impl Default for SignatureSuite {
    fn default() -> Self {
        SignatureSuite::Ed25519
    }
}
