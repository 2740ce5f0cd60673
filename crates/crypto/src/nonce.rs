//! Random nonce generation for signature headers.

use rand::rngs::OsRng;
use rand::RngCore;

/// Length of the anti-replay nonce carried in signature headers.
pub const NONCE_LEN: usize = 24;

/// Returns a fresh random nonce from the OS entropy source.
pub fn random_nonce() -> Vec<u8> {
    let mut nonce = vec![0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonces_are_fresh() {
        assert_eq!(random_nonce().len(), NONCE_LEN);
        assert_ne!(random_nonce(), random_nonce());
    }
}
