use git2::Repository;
use quire_types::{Author, RevisionId};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::git;
use crate::path::PhysicalPath;

/// Result of a commit attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A new revision was recorded.
    Created(RevisionId),
    /// The staged tree equals the tip tree. Carries the unchanged tip.
    Unchanged(Option<RevisionId>),
}

impl CommitOutcome {
    pub fn revision(&self) -> Option<RevisionId> {
        match self {
            Self::Created(id) => Some(*id),
            Self::Unchanged(tip) => *tip,
        }
    }
}

/// Stages working-copy paths and records them as one revision.
///
/// The index is rebuilt from the tip tree before staging, so only the
/// given paths can differ from the tip. Any failure leaves the tip and the
/// on-disk index unchanged.
pub struct CommitWriter<'r> {
    repo: &'r Repository,
    email_domain: &'r str,
}

impl<'r> CommitWriter<'r> {
    pub fn new(repo: &'r Repository, email_domain: &'r str) -> Self {
        Self { repo, email_domain }
    }

    pub fn commit(
        &self,
        paths: &[PhysicalPath],
        author: &Author,
        message: &str,
    ) -> StoreResult<CommitOutcome> {
        let workdir = self
            .repo
            .workdir()
            .ok_or_else(|| StoreError::Commit("repository has no working copy".into()))?;
        let parent = git::head_commit(self.repo).map_err(as_commit_error)?;
        let parent_tree = parent.as_ref().map(|c| c.tree()).transpose().map_err(commit_failed)?;

        let mut index = self.repo.index().map_err(commit_failed)?;
        match &parent_tree {
            Some(tree) => index.read_tree(tree).map_err(commit_failed)?,
            None => index.clear().map_err(commit_failed)?,
        }

        for path in paths {
            if path.to_fs_path(workdir).is_file() {
                index.add_path(path.as_path()).map_err(commit_failed)?;
            } else {
                index.remove_path(path.as_path()).map_err(commit_failed)?;
            }
        }

        let tree_id = index.write_tree().map_err(commit_failed)?;
        let unchanged = match &parent_tree {
            Some(tree) => tree.id() == tree_id,
            None => index.is_empty(),
        };
        if unchanged {
            let tip = parent
                .as_ref()
                .map(|c| git::from_oid(c.id()))
                .transpose()?;
            debug!(paths = paths.len(), "nothing to commit");
            return Ok(CommitOutcome::Unchanged(tip));
        }

        let tree = self.repo.find_tree(tree_id).map_err(commit_failed)?;
        let sig = git::signature(author, self.email_domain).map_err(as_commit_error)?;
        let parents: Vec<_> = parent.iter().collect();
        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .map_err(commit_failed)?;

        // HEAD already moved; a stale on-disk index only affects `git status`.
        if let Err(err) = index.write() {
            warn!(error = %err, "failed to persist index after commit");
        }

        let id = git::from_oid(oid)?;
        info!(revision = %id.short_hex(), author = %author.name, paths = paths.len(), "recorded revision");
        Ok(CommitOutcome::Created(id))
    }
}

fn commit_failed(err: git2::Error) -> StoreError {
    StoreError::Commit(err.message().to_string())
}

fn as_commit_error(err: StoreError) -> StoreError {
    match err {
        StoreError::Repository(e) => commit_failed(e),
        other => StoreError::Commit(other.to_string()),
    }
}
