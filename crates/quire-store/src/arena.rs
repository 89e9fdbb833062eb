//! In-memory index of the revision chain.
//!
//! Records live in a flat `Vec` in commit order; each record points at its
//! parent by index. Walks go newest-first by following those indices, and
//! cursor lookups go through a `RevisionId -> index` map.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use git2::{Commit, Delta as GitDelta, Repository, Sort};
use quire_types::{LastModified, LogEntry, RevisionId};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::git;

/// How a revision changed one path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Delta {
    Added,
    Modified,
    Deleted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathChange {
    /// Repository-relative path.
    pub path: String,
    pub delta: Delta,
}

/// One committed revision and the paths it changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevisionRecord {
    pub id: RevisionId,
    /// Index of the parent record, `None` for the first revision.
    pub parent: Option<usize>,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    /// Sorted by path.
    pub changes: Vec<PathChange>,
}

impl RevisionRecord {
    pub fn touches(&self, path: &str) -> bool {
        self.changes
            .binary_search_by(|c| c.path.as_str().cmp(path))
            .is_ok()
    }

    pub fn log_entry(&self) -> LogEntry {
        LogEntry {
            revision: self.id,
            author: self.author.clone(),
            timestamp: self.timestamp,
            message: self.message.clone(),
        }
    }

    pub fn last_modified(&self) -> LastModified {
        LastModified {
            revision: self.id,
            author: self.author.clone(),
            timestamp: self.timestamp,
        }
    }
}

/// Arena of revision records, oldest first.
#[derive(Clone, Debug, Default)]
pub struct RevisionArena {
    records: Vec<RevisionRecord>,
    index: HashMap<RevisionId, usize>,
    tip: Option<usize>,
}

impl RevisionArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the arena from the first-parent chain ending at `HEAD`.
    pub fn load(repo: &Repository) -> StoreResult<Self> {
        let mut arena = Self::new();
        if git::head_commit(repo)?.is_none() {
            return Ok(arena);
        }

        let mut walk = repo.revwalk()?;
        walk.push_head()?;
        walk.simplify_first_parent()?;
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;

        for oid in walk {
            let commit = repo.find_commit(oid?)?;
            let record = Self::describe(repo, &commit)?;
            arena.append(record)?;
        }
        debug!(revisions = arena.len(), "loaded revision arena");
        Ok(arena)
    }

    /// Describe `commit` as a record relative to its first parent.
    ///
    /// The returned record's `parent` is unset; [`RevisionArena::append`]
    /// fills it in.
    pub fn describe(repo: &Repository, commit: &Commit<'_>) -> StoreResult<RevisionRecord> {
        let tree = commit.tree()?;
        let parent_tree = match commit.parent(0) {
            Ok(parent) => Some(parent.tree()?),
            Err(_) => None,
        };
        let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

        let mut changes = Vec::new();
        for delta in diff.deltas() {
            let kind = match delta.status() {
                GitDelta::Added => Delta::Added,
                GitDelta::Deleted => Delta::Deleted,
                _ => Delta::Modified,
            };
            let file = if kind == Delta::Deleted {
                delta.old_file()
            } else {
                delta.new_file()
            };
            let Some(path) = file.path().and_then(|p| p.to_str()) else {
                continue;
            };
            changes.push(PathChange {
                path: path.replace('\\', "/"),
                delta: kind,
            });
        }
        changes.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(RevisionRecord {
            id: git::from_oid(commit.id())?,
            parent: None,
            author: commit.author().name().unwrap_or("unknown").to_string(),
            timestamp: git::commit_time(commit),
            message: commit.message().unwrap_or("").trim_end().to_string(),
            changes,
        })
    }

    /// Append a record as the new tip. Its parent becomes the old tip.
    pub fn append(&mut self, mut record: RevisionRecord) -> StoreResult<usize> {
        if self.index.contains_key(&record.id) {
            return Err(StoreError::Internal(format!(
                "revision {} already recorded",
                record.id
            )));
        }
        let position = self.records.len();
        record.parent = self.tip;
        self.index.insert(record.id, position);
        self.records.push(record);
        self.tip = Some(position);
        Ok(position)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn tip(&self) -> Option<&RevisionRecord> {
        self.tip.map(|i| &self.records[i])
    }

    pub fn tip_index(&self) -> Option<usize> {
        self.tip
    }

    pub fn position(&self, id: &RevisionId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, position: usize) -> Option<&RevisionRecord> {
        self.records.get(position)
    }

    /// Walk from `start` toward the first revision, newest first.
    pub fn ancestors(&self, start: Option<usize>) -> Ancestors<'_> {
        Ancestors {
            arena: self,
            next: start,
        }
    }

    /// Most recent revision at or before `start` that touched `path`.
    pub fn last_touch(&self, path: &str, start: Option<usize>) -> Option<&RevisionRecord> {
        self.ancestors(start).find(|r| r.touches(path))
    }
}

/// Newest-first iterator over a chain of records.
pub struct Ancestors<'a> {
    arena: &'a RevisionArena,
    next: Option<usize>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a RevisionRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.arena.records.get(self.next?)?;
        self.next = record.parent;
        Some(record)
    }
}
