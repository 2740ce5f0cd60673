//! Ed25519 signing using dcrypt.

use crate::error::CryptoError;
use rand::rngs::OsRng;

use dcrypt::sign::eddsa;
use dcrypt::Signature;

/// Ed25519 key pair used to sign proposals, envelopes, and config updates.
#[derive(Clone)]
pub struct Ed25519KeyPair {
    /// Public verification key
    public_key: eddsa::Ed25519PublicKey,
    /// Private signing key
    secret_key: eddsa::Ed25519SecretKey,
}

impl Ed25519KeyPair {
    /// Generate a new Ed25519 key pair
    pub fn generate() -> Result<Self, CryptoError> {
        let mut rng = OsRng;

        let (public_key, secret_key) =
            eddsa::Ed25519::keypair(&mut rng).map_err(CryptoError::from)?;

        Ok(Self {
            public_key,
            secret_key,
        })
    }

    /// Reconstruct a key pair from a 32-byte seed.
    pub fn from_seed(seed_bytes: &[u8]) -> Result<Self, CryptoError> {
        if seed_bytes.len() != 32 {
            return Err(CryptoError::InvalidKey(
                "Invalid private key length: expected 32 bytes".to_string(),
            ));
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(seed_bytes);

        let secret_key = eddsa::Ed25519SecretKey::from_seed(&seed).map_err(|e| {
            CryptoError::InvalidKey(format!("Failed to create secret key from seed: {:?}", e))
        })?;
        let public_key = secret_key.public_key().map_err(CryptoError::from)?;

        Ok(Self {
            public_key,
            secret_key,
        })
    }

    /// Sign a message, returning the raw signature bytes.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let signature = eddsa::Ed25519::sign(message, &self.secret_key)?;
        Ok(signature.to_bytes().to_vec())
    }

    /// The raw public key bytes (32 bytes).
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.public_key.to_bytes().to_vec()
    }

    /// The private seed bytes (32 bytes).
    pub fn seed_bytes(&self) -> Vec<u8> {
        self.secret_key.seed().to_vec()
    }
}

/// Verify `signature` over `message` against a raw 32-byte public key.
pub fn verify(message: &[u8], signature: &[u8], public_key: &[u8]) -> Result<(), CryptoError> {
    let pk = eddsa::Ed25519PublicKey::from_bytes(public_key)
        .map_err(|e| CryptoError::InvalidKey(format!("Failed to parse public key: {:?}", e)))?;
    let sig = eddsa::Ed25519Signature::from_bytes(signature)
        .map_err(|e| CryptoError::InvalidSignature(format!("Failed to parse signature: {:?}", e)))?;
    eddsa::Ed25519::verify(message, &sig, &pk).map_err(|_| CryptoError::VerificationFailed)
}

#[cfg(test)]
mod tests;
