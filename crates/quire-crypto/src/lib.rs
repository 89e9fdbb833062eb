//! Cryptographic primitives for the Quire wiki store.
//!
//! Provides domain-separated BLAKE3 key derivation and XChaCha20-Poly1305
//! sealing for the small configuration blobs the store keeps beside the
//! wiki content.
//!
//! All crypto operations wrap established libraries. No custom cryptography.

pub mod cipher;
pub mod error;
pub mod key;

pub use cipher::ConfigCipher;
pub use error::{CipherError, CipherResult};
pub use key::ConfigKey;
