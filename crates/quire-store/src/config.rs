use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::path::{FILES_DIR, PAGES_DIR};

/// Startup configuration for a [`GitStore`](crate::GitStore).
///
/// The config-blob key is deliberately not part of this struct; it is
/// passed to the store separately so it never ends up in a config file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Repository root (the working copy). Created and initialized if missing.
    pub root: PathBuf,
    /// Reserved metadata directory name, relative to `root`.
    pub meta_dir: String,
    /// Upper bound on waiting for the store lock. `None` waits forever.
    pub lock_timeout_ms: Option<u64>,
    /// Domain for author e-mail addresses when a caller supplies only a name.
    pub email_domain: String,
    /// Default history page size for callers that do not pick one.
    pub page_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            meta_dir: ".wiki".to_string(),
            lock_timeout_ms: None,
            email_domain: "localhost".to_string(),
            page_size: 50,
        }
    }
}

impl StoreConfig {
    /// Default configuration rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }

    /// Check invariants the store relies on.
    pub fn validate(&self) -> StoreResult<()> {
        let meta = self.meta_dir.as_str();
        if meta.is_empty() {
            return Err(StoreError::Config("meta_dir must not be empty".into()));
        }
        if meta.contains(['/', '\\']) || meta == "." || meta == ".." {
            return Err(StoreError::Config(format!(
                "meta_dir must be a single directory name, got {meta:?}"
            )));
        }
        if meta.eq_ignore_ascii_case(".git") || meta == PAGES_DIR || meta == FILES_DIR {
            return Err(StoreError::Config(format!(
                "meta_dir {meta:?} collides with a store directory"
            )));
        }
        if self.page_size == 0 {
            return Err(StoreError::Config("page_size must be at least 1".into()));
        }
        if self.email_domain.is_empty() {
            return Err(StoreError::Config("email_domain must not be empty".into()));
        }
        Ok(())
    }
}
