//! Paged, newest-first walks over the revision arena.

use quire_types::{ChangeKind, Cursor, HistoryPage, LogEntry, Namespace, RecentChange};

use crate::arena::{Ancestors, Delta, PathChange, RevisionArena, RevisionRecord};
use crate::error::{StoreError, StoreResult};
use crate::path::PathResolver;

/// Revisions that changed `path`, newest first.
pub fn path_history(
    arena: &RevisionArena,
    path: &str,
    cursor: Option<Cursor>,
    page_size: usize,
) -> StoreResult<HistoryPage<LogEntry>> {
    let start = start_of(arena, cursor)?;
    Ok(paginate(
        arena.ancestors(start),
        page_size,
        |record| record.touches(path),
        |record| vec![record.log_entry()],
    ))
}

/// One row per changed path per revision, newest revision first.
///
/// Rows of a single revision are never split across pages, so a page may
/// hold more than `page_size` rows.
pub fn recent_changes(
    arena: &RevisionArena,
    resolver: &PathResolver,
    cursor: Option<Cursor>,
    page_size: usize,
) -> StoreResult<HistoryPage<RecentChange>> {
    let start = start_of(arena, cursor)?;
    Ok(paginate(
        arena.ancestors(start),
        page_size,
        |record| !record.changes.is_empty(),
        |record| describe_changes(record, resolver),
    ))
}

fn start_of(arena: &RevisionArena, cursor: Option<Cursor>) -> StoreResult<Option<usize>> {
    let Some(cursor) = cursor else {
        return Ok(arena.tip_index());
    };
    let position = arena.position(&cursor.revision()).ok_or_else(|| {
        StoreError::InvalidRevision(format!("unknown cursor {}", cursor.to_token()))
    })?;
    Ok(arena.get(position).and_then(|record| record.parent))
}

fn paginate<'a, T>(
    mut walk: Ancestors<'a>,
    page_size: usize,
    include: impl Fn(&RevisionRecord) -> bool,
    project: impl Fn(&RevisionRecord) -> Vec<T>,
) -> HistoryPage<T> {
    let limit = page_size.max(1);
    let mut entries = Vec::new();
    let mut last = None;

    for record in walk.by_ref() {
        if !include(record) {
            continue;
        }
        entries.extend(project(record));
        last = Some(record.id);
        if entries.len() >= limit {
            break;
        }
    }

    let more = entries.len() >= limit && walk.any(|record| include(record));
    HistoryPage {
        entries,
        next: if more { last.map(Cursor::after) } else { None },
    }
}

fn describe_changes(record: &RevisionRecord, resolver: &PathResolver) -> Vec<RecentChange> {
    let classified: Vec<_> = record
        .changes
        .iter()
        .map(|change| (change, resolver.classify(&change.path)))
        .collect();
    let renamed = is_rename(&classified);

    classified
        .into_iter()
        .map(|(change, logical)| {
            let (namespace, name) = match logical {
                Some((ns, name)) => (Some(ns), name),
                None => (None, change.path.clone()),
            };
            let kind = match (namespace, change.delta) {
                (Some(Namespace::Files), Delta::Added | Delta::Modified) => ChangeKind::Uploaded,
                (_, Delta::Added | Delta::Deleted) if renamed => ChangeKind::Renamed,
                (_, Delta::Added) => ChangeKind::Created,
                (_, Delta::Modified) => ChangeKind::Edited,
                (_, Delta::Deleted) => ChangeKind::Deleted,
            };
            RecentChange {
                name,
                namespace,
                kind,
                revision: record.id,
                author: record.author.clone(),
                timestamp: record.timestamp,
                message: record.message.clone(),
            }
        })
        .collect()
}

/// A rename shows up as exactly one addition and one deletion of pages.
fn is_rename(changes: &[(&PathChange, Option<(Namespace, String)>)]) -> bool {
    let [(a, la), (b, lb)] = changes else {
        return false;
    };
    let pages = |l: &Option<(Namespace, String)>| matches!(l, Some((Namespace::Pages, _)));
    pages(la)
        && pages(lb)
        && matches!(
            (a.delta, b.delta),
            (Delta::Added, Delta::Deleted) | (Delta::Deleted, Delta::Added)
        )
}
