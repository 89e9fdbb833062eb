//! Foundation types for the Quire wiki store.
//!
//! Every other Quire crate depends on `quire-types`. The types here carry no
//! storage logic; they name revisions, select namespaces, and describe what
//! the store hands back to its callers.
//!
//! # Key Types
//!
//! - [`RevisionId`] -- Identifier of one committed revision
//! - [`RevisionSpec`] -- The tip, or a specific revision
//! - [`Namespace`] -- Pages, files, or store-private metadata
//! - [`Author`] -- Identity recorded on writes
//! - [`Cursor`] / [`HistoryPage`] -- Pagination for history walks
//! - [`Page`], [`File`], [`FileInfo`], [`LogEntry`], [`RecentChange`] -- Projections

pub mod cursor;
pub mod error;
pub mod namespace;
pub mod projection;
pub mod revision;

pub use cursor::{Cursor, HistoryPage};
pub use error::TypeError;
pub use namespace::{Author, Namespace};
pub use projection::{ChangeKind, File, FileInfo, LastModified, LogEntry, Page, RecentChange};
pub use revision::{RevisionId, RevisionSpec, REVISION_ID_LEN};
