//! Read-side projections returned by the store.
//!
//! None of these are persisted. They are derived on demand from the
//! working copy and the revision chain.

use std::borrow::Cow;
use std::fmt;
use std::io::Cursor as IoCursor;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::namespace::Namespace;
use crate::revision::RevisionId;

/// Who last touched an entity, and when.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastModified {
    pub revision: RevisionId,
    pub author: String,
    pub timestamp: DateTime<Utc>,
}

/// A wiki page as of some revision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    /// Normalized title.
    pub title: String,
    pub content: Vec<u8>,
    /// `None` only when the page exists on disk but no revision records it.
    pub last_modified: Option<LastModified>,
}

impl Page {
    /// Content decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    /// Revision of the last change to this page.
    pub fn revision(&self) -> Option<RevisionId> {
        self.last_modified.as_ref().map(|m| m.revision)
    }
}

/// An uploaded file as of some revision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct File {
    pub name: String,
    pub content: Vec<u8>,
    pub last_modified: Option<LastModified>,
}

impl File {
    /// Size of the content in bytes.
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Stream over the content.
    pub fn reader(&self) -> impl std::io::Read + '_ {
        IoCursor::new(self.content.as_slice())
    }

    pub fn revision(&self) -> Option<RevisionId> {
        self.last_modified.as_ref().map(|m| m.revision)
    }
}

/// Listing entry for an uploaded file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub last_modified: Option<LastModified>,
}

/// One revision in the history of a single path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub revision: RevisionId,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// What a revision did to one path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Edited,
    Renamed,
    Deleted,
    Uploaded,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Edited => "edited",
            Self::Renamed => "renamed",
            Self::Deleted => "deleted",
            Self::Uploaded => "uploaded",
        };
        f.write_str(s)
    }
}

/// One changed path of one revision, as shown in the recent-changes feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentChange {
    /// Logical name (page title or file name). Paths outside the wiki
    /// namespaces are reported verbatim.
    pub name: String,
    /// `None` for paths outside the wiki namespaces.
    pub namespace: Option<Namespace>,
    pub kind: ChangeKind,
    pub revision: RevisionId,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}
