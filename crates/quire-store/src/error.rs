use std::time::Duration;

use quire_crypto::CipherError;
use quire_types::TypeError;

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A logical name failed sanitization (traversal, reserved name, empty).
    #[error("invalid name {name:?}: {reason}")]
    InvalidPath { name: String, reason: String },

    /// The entity does not exist at the requested revision.
    #[error("not found: {0}")]
    NotFound(String),

    /// A revision identifier or cursor could not be resolved.
    #[error("invalid revision: {0}")]
    InvalidRevision(String),

    /// The destination of a rename is already taken.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Staging or committing failed. The tip is unchanged.
    #[error("commit failed: {0}")]
    Commit(String),

    /// A configuration blob failed to decrypt.
    #[error("config blob could not be decrypted: {0}")]
    Decryption(CipherError),

    /// The store lock could not be acquired in time.
    #[error("timed out after {0:?} waiting for the store lock")]
    LockTimeout(Duration),

    /// Error from the underlying repository outside of a commit.
    #[error("repository error: {0}")]
    Repository(#[from] git2::Error),

    /// I/O error from the working copy or metadata directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub(crate) fn invalid_path(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns `true` when the requested entity or revision does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns `true` when the caller's input is at fault. Retrying the same
    /// request will fail the same way.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPath { .. }
                | Self::NotFound(_)
                | Self::InvalidRevision(_)
                | Self::AlreadyExists(_)
        )
    }
}

impl From<TypeError> for StoreError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidRevision(s) | TypeError::InvalidCursor(s) => Self::InvalidRevision(s),
            other => Self::InvalidRevision(other.to_string()),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_classified() {
        assert!(StoreError::NotFound("home".into()).is_client_error());
        assert!(StoreError::invalid_path("../x", "traversal").is_client_error());
        assert!(!StoreError::Commit("disk full".into()).is_client_error());
        assert!(!StoreError::Decryption(CipherError::Decryption).is_client_error());
    }

    #[test]
    fn type_errors_become_invalid_revision() {
        let err: StoreError = TypeError::InvalidCursor("nope".into()).into();
        assert!(matches!(err, StoreError::InvalidRevision(s) if s == "nope"));
    }

    #[test]
    fn display_includes_reason() {
        let err = StoreError::invalid_path("a/../b", "parent-directory segment");
        assert_eq!(
            err.to_string(),
            "invalid name \"a/../b\": parent-directory segment"
        );
    }
}
