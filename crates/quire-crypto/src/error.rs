/// Errors from sealing or opening configuration blobs.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CipherError {
    /// Key material could not be parsed.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The blob does not start with the expected format marker.
    #[error("not a sealed config blob")]
    BadMagic,

    /// The blob is shorter than its fixed header.
    #[error("sealed blob truncated: {len} bytes")]
    Truncated { len: usize },

    /// Authentication failed: wrong key, wrong name, or tampered ciphertext.
    #[error("decryption failed")]
    Decryption,

    /// Sealing failed inside the AEAD implementation.
    #[error("encryption failed")]
    Encryption,
}

/// Result alias for cipher operations.
pub type CipherResult<T> = Result<T, CipherError>;
