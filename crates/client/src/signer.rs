//! MSP-backed signing identity.
//!
//! An identity is materialized from an MSP directory produced by the CA
//! bootstrap tooling:
//!
//! ```text
//! <msp dir>/signcerts/cert.pem   identity certificate (PEM, sent verbatim)
//! <msp dir>/keystore/key.hex     hex-encoded 32-byte Ed25519 seed
//! ```

use std::path::Path;

use weft_crypto::{Ed25519KeyPair, SignatureSuite};
use weft_proto::common::SerializedIdentity;
use weft_types::error::IdentityError;
use weft_types::identity::SigningIdentity;

const SIGNCERT_FILE: &str = "signcerts/cert.pem";
const KEYSTORE_FILE: &str = "keystore/key.hex";

/// A signing identity bound to one organization's MSP.
pub struct MspSigner {
    msp_id: String,
    keypair: Ed25519KeyPair,
    /// Serialized identity (MSP id + certificate), computed once.
    identity_bytes: Vec<u8>,
}

impl MspSigner {
    /// Builds a signer from in-memory material.
    pub fn new(msp_id: impl Into<String>, certificate: Vec<u8>, keypair: Ed25519KeyPair) -> Self {
        let msp_id = msp_id.into();
        let identity_bytes = weft_proto::encode(&SerializedIdentity {
            msp_id: msp_id.clone(),
            id_bytes: certificate,
        });
        Self {
            msp_id,
            keypair,
            identity_bytes,
        }
    }

    /// Materializes a signer from an MSP directory.
    pub fn load(msp_id: &str, dir: impl AsRef<Path>) -> Result<Self, IdentityError> {
        let dir = dir.as_ref();
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read(&path).map_err(|source| IdentityError::Io {
                path: path.display().to_string(),
                source,
            })
        };

        let certificate = read(SIGNCERT_FILE)?;
        let key_hex = read(KEYSTORE_FILE)?;
        let seed = hex::decode(String::from_utf8_lossy(&key_hex).trim())
            .map_err(|e| IdentityError::InvalidKey(format!("key file is not hex: {e}")))?;
        let keypair = SignatureSuite::default()
            .keypair_from_seed(&seed)
            .map_err(|e| IdentityError::InvalidKey(e.to_string()))?;

        Ok(Self::new(msp_id, certificate, keypair))
    }
}

impl SigningIdentity for MspSigner {
    fn msp_id(&self) -> &str {
        &self.msp_id
    }

    fn serialize(&self) -> Vec<u8> {
        self.identity_bytes.clone()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, IdentityError> {
        self.keypair
            .sign(message)
            .map_err(|e| IdentityError::Sign(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_identity_carries_msp_id_and_certificate() {
        let keypair = Ed25519KeyPair::generate().unwrap();
        let signer = MspSigner::new("Org1MSP", b"---cert---".to_vec(), keypair);
        let identity: SerializedIdentity = weft_proto::decode(&signer.serialize()).unwrap();
        assert_eq!(identity.msp_id, "Org1MSP");
        assert_eq!(identity.id_bytes, b"---cert---");
    }

    #[test]
    fn load_roundtrips_through_an_msp_dir() {
        let keypair = Ed25519KeyPair::generate().unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("signcerts")).unwrap();
        std::fs::create_dir_all(dir.path().join("keystore")).unwrap();
        std::fs::write(dir.path().join(SIGNCERT_FILE), b"---cert---").unwrap();
        std::fs::write(
            dir.path().join(KEYSTORE_FILE),
            hex::encode(keypair.seed_bytes()),
        )
        .unwrap();

        let signer = MspSigner::load("Org1MSP", dir.path()).unwrap();
        let message = b"payload";
        assert_eq!(
            signer.sign(message).unwrap(),
            keypair.sign(message).unwrap()
        );
    }

    #[test]
    fn missing_key_material_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            MspSigner::load("Org1MSP", dir.path()),
            Err(IdentityError::Io { .. })
        ));
    }
}
