use crate::error::{CipherError, CipherResult};

/// Length of a configuration key in bytes.
pub const KEY_LEN: usize = 32;

/// BLAKE3 key-derivation context. Changing it invalidates every sealed blob.
const DERIVE_CONTEXT: &str = "quire 2024-06 config-blob key v1";

/// Symmetric key protecting configuration blobs.
///
/// Supplied once at startup and shared process-wide. The raw bytes never
/// appear in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ConfigKey([u8; KEY_LEN]);

impl ConfigKey {
    /// Use raw key bytes as-is.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive a key from arbitrary secret material (a passphrase, a key file).
    ///
    /// Domain-separated BLAKE3 key derivation; the same secret always yields
    /// the same key.
    pub fn derive(secret: &[u8]) -> Self {
        Self(blake3::derive_key(DERIVE_CONTEXT, secret))
    }

    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// Parse a 64-character hex key.
    pub fn from_hex(s: &str) -> CipherResult<Self> {
        let bytes = hex::decode(s.trim()).map_err(|e| CipherError::InvalidKey(e.to_string()))?;
        if bytes.len() != KEY_LEN {
            return Err(CipherError::InvalidKey(format!(
                "expected {KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; KEY_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Hex-encoded key, for writing a key file.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for ConfigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConfigKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_is_deterministic() {
        assert_eq!(ConfigKey::derive(b"hunter2"), ConfigKey::derive(b"hunter2"));
    }

    #[test]
    fn different_secrets_give_different_keys() {
        assert_ne!(ConfigKey::derive(b"a"), ConfigKey::derive(b"b"));
    }

    #[test]
    fn derived_key_is_not_plain_hash() {
        let derived = ConfigKey::derive(b"secret");
        assert_ne!(derived.as_bytes(), blake3::hash(b"secret").as_bytes());
    }

    #[test]
    fn hex_roundtrip() {
        let key = ConfigKey::generate();
        assert_eq!(ConfigKey::from_hex(&key.to_hex()).unwrap(), key);
    }

    #[test]
    fn short_hex_is_rejected() {
        assert!(matches!(
            ConfigKey::from_hex("abcd"),
            Err(CipherError::InvalidKey(_))
        ));
    }

    #[test]
    fn debug_is_redacted() {
        let key = ConfigKey::from_bytes([0x11; KEY_LEN]);
        let debug = format!("{key:?}");
        assert_eq!(debug, "ConfigKey(<redacted>)");
        assert!(!debug.contains("11"));
    }
}
