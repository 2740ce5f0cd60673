//! Local error types for the `weft-crypto` crate.

use thiserror::Error;

/// Errors from cryptographic primitives.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Key material could not be parsed or derived.
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    /// A signature could not be parsed.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    /// Signature verification failed.
    #[error("Verification failed")]
    VerificationFailed,
    /// The underlying backend reported an error.
    #[error("Crypto backend error: {0}")]
    Backend(String),
}

impl From<dcrypt::Error> for CryptoError {
    fn from(e: dcrypt::Error) -> Self {
        CryptoError::Backend(e.to_string())
    }
}
