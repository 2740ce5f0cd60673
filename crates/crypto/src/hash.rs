//! Cryptographic hashing using dcrypt.

use crate::error::CryptoError;
use dcrypt::algorithms::hash::sha2::Sha256 as DcryptSha256;
use dcrypt::algorithms::hash::HashFunction as DcryptHashFunction;
use dcrypt::algorithms::ByteSerializable;

/// SHA-256 digest of `message`.
pub fn sha256(message: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let digest = DcryptSha256::digest(message).map_err(dcrypt::Error::from)?;
    Ok(digest.to_bytes())
}
