use super::*;

#[test]
fn test_sign_and_verify() {
    let keypair = Ed25519KeyPair::generate().unwrap();
    let message = b"Test message";

    let signature = keypair.sign(message).unwrap();
    assert!(verify(message, &signature, &keypair.public_key_bytes()).is_ok());
}

#[test]
fn test_seed_roundtrip() {
    let keypair = Ed25519KeyPair::generate().unwrap();

    let seed = keypair.seed_bytes();
    assert_eq!(seed.len(), 32);

    let reloaded = Ed25519KeyPair::from_seed(&seed).unwrap();
    assert_eq!(reloaded.public_key_bytes(), keypair.public_key_bytes());

    // Ed25519 is deterministic: the reloaded key signs identically.
    let message = b"Test message for persistence";
    assert_eq!(
        keypair.sign(message).unwrap(),
        reloaded.sign(message).unwrap()
    );
}

#[test]
fn test_tampered_message_fails_verification() {
    let keypair = Ed25519KeyPair::generate().unwrap();
    let signature = keypair.sign(b"original").unwrap();
    assert!(verify(b"tampered", &signature, &keypair.public_key_bytes()).is_err());
}

#[test]
fn test_short_seed_rejected() {
    assert!(Ed25519KeyPair::from_seed(&[0u8; 16]).is_err());
}
