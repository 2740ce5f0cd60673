//! The signing-identity contract.

use crate::error::IdentityError;

/// An opaque signer bound to one organization.
///
/// One identity exists per organization per process; it is materialized
/// once and never mutated. `serialize` returns the identity's certificate
/// material in the network's wire encoding so that it can be embedded as
/// the `creator` of headers; `sign` produces a signature over arbitrary
/// bytes with the identity's private key.
pub trait SigningIdentity: Send + Sync {
    /// The membership-service-provider id this identity belongs to.
    fn msp_id(&self) -> &str;

    /// The identity's serialized certificate material (wire encoding).
    fn serialize(&self) -> Vec<u8>;

    /// Signs `message` with the identity's private key.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, IdentityError>;
}
