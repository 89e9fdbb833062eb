use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};

use crate::error::{CipherError, CipherResult};
use crate::key::ConfigKey;

/// Format marker at the start of every sealed blob.
pub const MAGIC: &[u8; 4] = b"QCB1";

/// XChaCha20 nonce length.
pub const NONCE_LEN: usize = 24;

/// Poly1305 tag length.
pub const TAG_LEN: usize = 16;

const HEADER_LEN: usize = MAGIC.len() + NONCE_LEN;

/// Authenticated encryption for named configuration blobs.
///
/// Sealed layout:
/// ```text
/// [4 bytes: "QCB1"]
/// [24 bytes: random nonce]
/// [N + 16 bytes: ciphertext || Poly1305 tag]
/// ```
///
/// The blob name is bound in as associated data, so a blob copied under a
/// different name fails to open.
pub struct ConfigCipher {
    aead: XChaCha20Poly1305,
}

impl ConfigCipher {
    pub fn new(key: &ConfigKey) -> Self {
        Self {
            aead: XChaCha20Poly1305::new(Key::from_slice(key.as_bytes())),
        }
    }

    /// Encrypt `plaintext` for storage under `name`.
    pub fn seal(&self, name: &str, plaintext: &[u8]) -> CipherResult<Vec<u8>> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::Rng::fill(&mut rand::thread_rng(), &mut nonce);

        let ciphertext = self
            .aead
            .encrypt(
                XNonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: name.as_bytes(),
                },
            )
            .map_err(|_| CipherError::Encryption)?;

        let mut out = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt a blob previously sealed under `name`.
    ///
    /// Never returns unauthenticated bytes.
    pub fn open(&self, name: &str, sealed: &[u8]) -> CipherResult<Vec<u8>> {
        if sealed.len() < HEADER_LEN + TAG_LEN {
            if sealed.len() >= MAGIC.len() && &sealed[..MAGIC.len()] != MAGIC {
                return Err(CipherError::BadMagic);
            }
            return Err(CipherError::Truncated { len: sealed.len() });
        }
        let (magic, rest) = sealed.split_at(MAGIC.len());
        if magic != MAGIC {
            return Err(CipherError::BadMagic);
        }
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

        self.aead
            .decrypt(
                XNonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: name.as_bytes(),
                },
            )
            .map_err(|_| CipherError::Decryption)
    }
}

impl std::fmt::Debug for ConfigCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConfigCipher(XChaCha20Poly1305)")
    }
}
