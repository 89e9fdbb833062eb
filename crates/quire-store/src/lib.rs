//! Revision-controlled content storage for the Quire wiki.
//!
//! Pages, uploaded files, and their full history live in a git repository
//! with a working copy. Every page or file mutation is exactly one commit.
//! Configuration blobs sit beside the content in an untracked metadata
//! directory, sealed with XChaCha20-Poly1305.
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   pages/<title>.md          one file per page, titles may nest
//!   files/<name>              flat namespace of uploads
//!   <meta_dir>/<name>.json.enc  sealed config blobs (never committed)
//! ```
//!
//! # Concurrency
//!
//! A [`GitStore`] admits many readers or one writer. A writer holds the
//! lock from its first working-copy change until the commit is recorded,
//! so readers see either the old tip or the new one, never a mix.
//!
//! # Design Rules
//!
//! 1. Every logical name is resolved through [`PathResolver`] before it
//!    reaches the filesystem or the index.
//! 2. A commit stages exactly the paths the operation touched.
//! 3. A failed commit restores the working copy; the tip does not move.
//! 4. A write that changes nothing returns the current tip.
//! 5. History follows first parents only.

pub mod accessor;
pub mod arena;
pub mod commit;
pub mod config;
pub mod error;
pub mod history;
pub mod lock;
pub mod path;
pub mod store;
pub mod traits;
pub mod vault;

mod git;
mod workdir;

// Re-export primary types at crate root for ergonomic imports.
pub use accessor::RevisionAccessor;
pub use arena::{Delta, PathChange, RevisionArena, RevisionRecord};
pub use commit::{CommitOutcome, CommitWriter};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use path::{normalize_title, PathResolver, PhysicalPath};
pub use store::GitStore;
pub use traits::ContentStore;
pub use vault::ConfigVault;
