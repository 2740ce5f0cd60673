//! Multi-organization signing over a pending configuration update.

use weft_crypto::random_nonce;
use weft_proto::common::{ConfigSignature, SignatureHeader};
use weft_types::error::ConfigTxError;
use weft_types::identity::SigningIdentity;

/// Signs `update_bytes` on behalf of one organization.
///
/// The signature covers a fresh signature header (serialized creator plus a
/// random nonce) concatenated with the update bytes. The caller must sign
/// the exact bytes it later broadcasts: signing a stale update produces a
/// signature the orderer will reject, and that mistake is not detectable
/// here.
pub fn sign_update(
    update_bytes: &[u8],
    signer: &dyn SigningIdentity,
) -> Result<ConfigSignature, ConfigTxError> {
    let header = SignatureHeader {
        creator: signer.serialize(),
        nonce: random_nonce(),
    };
    let header_bytes = weft_proto::encode(&header);

    let mut to_sign = Vec::with_capacity(header_bytes.len() + update_bytes.len());
    to_sign.extend_from_slice(&header_bytes);
    to_sign.extend_from_slice(update_bytes);
    let signature = signer.sign(&to_sign)?;

    Ok(ConfigSignature {
        signature_header: header_bytes,
        signature,
    })
}

/// Collects one signature per identity over the same update, preserving
/// the input order. Call once per organization per update.
pub fn collect_signatures(
    update_bytes: &[u8],
    signers: &[&dyn SigningIdentity],
) -> Result<Vec<ConfigSignature>, ConfigTxError> {
    signers
        .iter()
        .map(|signer| sign_update(update_bytes, *signer))
        .collect()
}
