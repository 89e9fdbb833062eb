//! Thin helpers over `git2`.
//!
//! `git2::Repository` is not `Sync`, so the store keeps only the working
//! copy path in shared state and opens a handle per operation.

use std::fs;
use std::io::Write as _;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use git2::{Commit, ErrorCode, Oid, Repository, Signature};
use quire_types::{Author, RevisionId};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

pub(crate) fn open(root: &Path) -> StoreResult<Repository> {
    Ok(Repository::open(root)?)
}

/// Open the repository at `root`, initializing it when absent.
pub(crate) fn open_or_init(root: &Path) -> StoreResult<Repository> {
    match Repository::open(root) {
        Ok(repo) => Ok(repo),
        Err(err) if err.code() == ErrorCode::NotFound => {
            info!(root = %root.display(), "initializing repository");
            let repo = Repository::init(root)?;
            {
                let mut config = repo.config()?;
                if let Err(err) = config.set_bool("commit.gpgsign", false) {
                    warn!(error = %err, "could not disable commit signing");
                }
            }
            Ok(repo)
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn to_oid(id: RevisionId) -> StoreResult<Oid> {
    Ok(Oid::from_bytes(id.as_bytes())?)
}

pub(crate) fn from_oid(oid: Oid) -> StoreResult<RevisionId> {
    RevisionId::from_slice(oid.as_bytes()).map_err(|e| StoreError::Internal(e.to_string()))
}

/// The commit `HEAD` points at, or `None` for an unborn branch.
pub(crate) fn head_commit(repo: &Repository) -> StoreResult<Option<Commit<'_>>> {
    let head = match repo.head() {
        Ok(head) => head,
        Err(err) if matches!(err.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
            return Ok(None)
        }
        Err(err) => return Err(err.into()),
    };
    Ok(Some(head.peel_to_commit()?))
}

/// Build a commit signature for `author`, synthesizing an address under
/// `email_domain` when none was given.
pub(crate) fn signature(author: &Author, email_domain: &str) -> StoreResult<Signature<'static>> {
    let email = match &author.email {
        Some(email) => email.clone(),
        None => format!("{}@{email_domain}", mailbox(&author.name)),
    };
    Ok(Signature::now(&author.name, &email)?)
}

fn mailbox(name: &str) -> String {
    let local: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let local = local.trim_matches('-');
    if local.is_empty() {
        "anonymous".to_string()
    } else {
        local.to_string()
    }
}

pub(crate) fn commit_time(commit: &Commit<'_>) -> DateTime<Utc> {
    Utc.timestamp_opt(commit.time().seconds(), 0)
        .single()
        .unwrap_or_default()
}

/// Keep `dir` out of the index by listing it in `.git/info/exclude`.
pub(crate) fn ensure_excluded(repo: &Repository, dir: &str) -> StoreResult<()> {
    let info = repo.path().join("info");
    fs::create_dir_all(&info)?;
    let exclude = info.join("exclude");
    let rule = format!("/{dir}/");
    let existing = match fs::read_to_string(&exclude) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(err.into()),
    };
    if existing.lines().any(|line| line.trim() == rule) {
        return Ok(());
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&exclude)?;
    if !existing.is_empty() && !existing.ends_with('\n') {
        file.write_all(b"\n")?;
    }
    writeln!(file, "{rule}")?;
    debug!(rule = %rule, "added exclude rule");
    Ok(())
}
