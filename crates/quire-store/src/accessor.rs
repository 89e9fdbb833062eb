use std::path::Path;

use git2::{ObjectType, Repository};
use quire_types::{RevisionId, RevisionSpec};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::git;
use crate::path::PhysicalPath;
use crate::workdir;

/// Reads entity bytes at the tip or at a past revision.
///
/// The tip is served from the working copy, which always matches the tip
/// revision while no write holds the lock. Past revisions are read from
/// the commit tree.
pub struct RevisionAccessor<'a> {
    root: &'a Path,
}

impl<'a> RevisionAccessor<'a> {
    pub fn new(root: &'a Path) -> Self {
        Self { root }
    }

    pub fn read(&self, path: &PhysicalPath, revision: RevisionSpec) -> StoreResult<Vec<u8>> {
        match revision {
            RevisionSpec::Tip => self.read_tip(path),
            RevisionSpec::At(id) => {
                let repo = git::open(self.root)?;
                read_at(&repo, path, id)
            }
        }
    }

    fn read_tip(&self, path: &PhysicalPath) -> StoreResult<Vec<u8>> {
        workdir::read_file(&path.to_fs_path(self.root))?
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }
}

/// Read `path` from the tree of commit `id`.
pub fn read_at(repo: &Repository, path: &PhysicalPath, id: RevisionId) -> StoreResult<Vec<u8>> {
    let commit = repo
        .find_commit(git::to_oid(id)?)
        .map_err(|e| StoreError::InvalidRevision(format!("{id}: {}", e.message())))?;
    let tree = commit.tree()?;
    let entry = match tree.get_path(path.as_path()) {
        Ok(entry) => entry,
        Err(e) if e.code() == git2::ErrorCode::NotFound => {
            return Err(StoreError::NotFound(format!("{path} at {}", id.short_hex())))
        }
        Err(e) => return Err(e.into()),
    };
    if entry.kind() != Some(ObjectType::Blob) {
        return Err(StoreError::NotFound(format!("{path} at {}", id.short_hex())));
    }
    let blob = repo.find_blob(entry.id())?;
    debug!(path = %path, revision = %id.short_hex(), size = blob.size(), "read historical blob");
    Ok(blob.content().to_vec())
}
