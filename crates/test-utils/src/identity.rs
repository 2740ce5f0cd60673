//! Identity fixtures.

use std::sync::Arc;

use weft_client::MspSigner;
use weft_crypto::Ed25519KeyPair;

/// A fresh signer with a generated key and a placeholder certificate.
pub fn test_signer(msp_id: &str) -> Arc<MspSigner> {
    let keypair = Ed25519KeyPair::generate().expect("keypair generation");
    let certificate = format!(
        "-----BEGIN CERTIFICATE-----\n{msp_id}\n-----END CERTIFICATE-----\n"
    );
    Arc::new(MspSigner::new(msp_id, certificate.into_bytes(), keypair))
}
