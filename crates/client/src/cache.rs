//! Process-wide cache of materialized signing identities.
//!
//! Materializing an MSP signer reads key material from disk, so it happens
//! once per identity. The cache is an explicit object owned by the session
//! that created it, not a module-level singleton; the lock spans the whole
//! check-then-insert sequence so concurrent first use of one identity
//! materializes it exactly once.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use weft_types::error::IdentityError;

use crate::signer::MspSigner;

/// Keyed store of one [`MspSigner`] per identity name.
#[derive(Default)]
pub struct IdentityCache {
    inner: Mutex<HashMap<String, Arc<MspSigner>>>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached signer for `name`, materializing it from
    /// `msp_dir` on first use.
    pub fn get_or_load(
        &self,
        name: &str,
        msp_id: &str,
        msp_dir: impl AsRef<Path>,
    ) -> Result<Arc<MspSigner>, IdentityError> {
        let mut inner = self.inner.lock();
        if let Some(signer) = inner.get(name) {
            debug!(identity = name, "cached signer hit");
            return Ok(Arc::clone(signer));
        }
        let signer = Arc::new(MspSigner::load(msp_id, msp_dir)?);
        inner.insert(name.to_string(), Arc::clone(&signer));
        Ok(signer)
    }

    /// Inserts an already-materialized signer under `name`.
    pub fn insert(&self, name: &str, signer: Arc<MspSigner>) {
        self.inner.lock().insert(name.to_string(), signer);
    }

    /// Number of cached identities.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_crypto::Ed25519KeyPair;

    fn write_msp_dir(dir: &Path) {
        let keypair = Ed25519KeyPair::generate().unwrap();
        std::fs::create_dir_all(dir.join("signcerts")).unwrap();
        std::fs::create_dir_all(dir.join("keystore")).unwrap();
        std::fs::write(dir.join("signcerts/cert.pem"), b"---cert---").unwrap();
        std::fs::write(
            dir.join("keystore/key.hex"),
            hex::encode(keypair.seed_bytes()),
        )
        .unwrap();
    }

    #[test]
    fn second_lookup_reuses_the_first_materialization() {
        let dir = tempfile::tempdir().unwrap();
        write_msp_dir(dir.path());

        let cache = IdentityCache::new();
        let first = cache.get_or_load("admin@org1", "Org1MSP", dir.path()).unwrap();
        let second = cache.get_or_load("admin@org1", "Org1MSP", dir.path()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_names_materialize_separately() {
        let dir = tempfile::tempdir().unwrap();
        write_msp_dir(dir.path());

        let cache = IdentityCache::new();
        let a = cache.get_or_load("admin@org1", "Org1MSP", dir.path()).unwrap();
        let b = cache.get_or_load("admin@org2", "Org2MSP", dir.path()).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }
}
