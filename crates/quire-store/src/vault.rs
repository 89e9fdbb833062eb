use std::path::Path;

use quire_crypto::{ConfigCipher, ConfigKey};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::path::PhysicalPath;
use crate::workdir;

/// Encrypted, untracked configuration blobs under the metadata directory.
///
/// Blobs never enter the revision history. Each write replaces the whole
/// blob atomically.
#[derive(Debug)]
pub struct ConfigVault {
    cipher: ConfigCipher,
}

impl ConfigVault {
    pub fn new(key: &ConfigKey) -> Self {
        Self {
            cipher: ConfigCipher::new(key),
        }
    }

    pub fn get(&self, root: &Path, name: &str, path: &PhysicalPath) -> StoreResult<Vec<u8>> {
        let sealed = workdir::read_file(&path.to_fs_path(root))?
            .ok_or_else(|| StoreError::NotFound(format!("config {name}")))?;
        self.cipher
            .open(name, &sealed)
            .map_err(StoreError::Decryption)
    }

    pub fn put(&self, root: &Path, name: &str, path: &PhysicalPath, data: &[u8]) -> StoreResult<()> {
        let sealed = self
            .cipher
            .seal(name, data)
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        workdir::atomic_write(&path.to_fs_path(root), &sealed)?;
        debug!(config = name, bytes = data.len(), "stored config blob");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathResolver;
    use quire_crypto::CipherError;
    use quire_types::Namespace;
    use std::fs;

    fn config_path(name: &str) -> PhysicalPath {
        PathResolver::new(".wiki")
            .resolve(name, Namespace::Meta)
            .unwrap()
    }

    #[test]
    fn put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let vault = ConfigVault::new(&ConfigKey::derive(b"k"));
        let path = config_path("users");
        vault.put(dir.path(), "users", &path, b"{\"ada\":{}}").unwrap();
        assert_eq!(vault.get(dir.path(), "users", &path).unwrap(), b"{\"ada\":{}}");

        let raw = fs::read(dir.path().join(".wiki/users.json.enc")).unwrap();
        assert_ne!(raw, b"{\"ada\":{}}");
    }

    #[test]
    fn missing_blob_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let vault = ConfigVault::new(&ConfigKey::derive(b"k"));
        let err = vault.get(dir.path(), "users", &config_path("users")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn wrong_key_is_decryption_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_path("settings");
        ConfigVault::new(&ConfigKey::derive(b"one"))
            .put(dir.path(), "settings", &path, b"{}")
            .unwrap();
        let err = ConfigVault::new(&ConfigKey::derive(b"two"))
            .get(dir.path(), "settings", &path)
            .unwrap_err();
        assert!(matches!(err, StoreError::Decryption(CipherError::Decryption)));
    }

    #[test]
    fn overwrite_replaces_whole_blob() {
        let dir = tempfile::tempdir().unwrap();
        let vault = ConfigVault::new(&ConfigKey::derive(b"k"));
        let path = config_path("users");
        vault.put(dir.path(), "users", &path, b"first version, longer").unwrap();
        vault.put(dir.path(), "users", &path, b"second").unwrap();
        assert_eq!(vault.get(dir.path(), "users", &path).unwrap(), b"second");
    }
}
