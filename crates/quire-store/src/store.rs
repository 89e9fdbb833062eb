use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use quire_crypto::ConfigKey;
use quire_types::{
    Author, Cursor, File, FileInfo, HistoryPage, LastModified, LogEntry, Namespace, Page,
    RecentChange, RevisionId, RevisionSpec,
};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::accessor::RevisionAccessor;
use crate::arena::{RevisionArena, RevisionRecord};
use crate::commit::{CommitOutcome, CommitWriter};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::git;
use crate::history;
use crate::lock::Serializer;
use crate::path::{PathResolver, PhysicalPath, FILES_DIR, PAGES_DIR};
use crate::traits::ContentStore;
use crate::vault::ConfigVault;
use crate::workdir::{self, Edit};

/// [`ContentStore`] backed by a git repository with a working copy.
///
/// Pages live under `pages/`, files under `files/`, and sealed config
/// blobs under the untracked metadata directory. The revision arena is
/// built once at open and extended in place on every commit.
pub struct GitStore {
    root: PathBuf,
    resolver: PathResolver,
    vault: ConfigVault,
    email_domain: String,
    page_size: usize,
    /// Guards the arena and, by convention, the working copy.
    state: Serializer<RevisionArena>,
    #[cfg(test)]
    before_commit: Option<Box<dyn Fn() + Send + Sync>>,
}

impl GitStore {
    /// Open the store at `config.root`, initializing a repository there if
    /// none exists.
    pub fn open(config: &StoreConfig, key: &ConfigKey) -> StoreResult<Self> {
        config.validate()?;
        fs::create_dir_all(&config.root)?;
        let repo = git::open_or_init(&config.root)?;
        let root = repo
            .workdir()
            .ok_or_else(|| {
                StoreError::Config(format!("{} is a bare repository", config.root.display()))
            })?
            .to_path_buf();

        git::ensure_excluded(&repo, &config.meta_dir)?;
        fs::create_dir_all(root.join(&config.meta_dir))?;
        let arena = RevisionArena::load(&repo)?;

        info!(
            root = %root.display(),
            revisions = arena.len(),
            "opened content store"
        );
        Ok(Self {
            root,
            resolver: PathResolver::new(config.meta_dir.clone()),
            vault: ConfigVault::new(key),
            email_domain: config.email_domain.clone(),
            page_size: config.page_size,
            state: Serializer::new(arena, config.lock_timeout()),
            #[cfg(test)]
            before_commit: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configured default for history page sizes.
    pub fn default_page_size(&self) -> usize {
        self.page_size
    }

    /// The most recent revision, or `None` before the first write.
    pub fn tip(&self) -> StoreResult<Option<RevisionId>> {
        Ok(self.state.shared()?.tip().map(|r| r.id))
    }

    fn read_entity(
        &self,
        path: &PhysicalPath,
        revision: RevisionSpec,
        label: impl FnOnce() -> String,
    ) -> StoreResult<(Vec<u8>, Option<LastModified>)> {
        let arena = self.state.shared()?;
        let content = RevisionAccessor::new(&self.root)
            .read(path, revision)
            .map_err(|err| match err {
                StoreError::NotFound(_) => StoreError::NotFound(label()),
                other => other,
            })?;
        let start = match revision {
            RevisionSpec::Tip => arena.tip_index(),
            RevisionSpec::At(id) => arena.position(&id),
        };
        let last_modified = arena
            .last_touch(path.as_str(), start)
            .map(RevisionRecord::last_modified);
        Ok((content, last_modified))
    }

    /// Apply `stage` to the working copy and commit the touched paths.
    ///
    /// Runs under the exclusive lock. `stage` returns the default commit
    /// message, used when `message` is blank. If staging or the commit
    /// fails, the working copy is restored before returning.
    fn write(
        &self,
        author: &Author,
        message: &str,
        stage: impl FnOnce(&mut Edit<'_>) -> StoreResult<String>,
    ) -> StoreResult<RevisionId> {
        let mut arena = self.state.exclusive()?;
        let mut edit = Edit::new(&self.root);
        let message = match stage(&mut edit) {
            Ok(default) => message_or(message, || default),
            Err(err) => {
                edit.rollback();
                return Err(match err {
                    StoreError::Io(e) => {
                        StoreError::Commit(format!("working copy update failed: {e}"))
                    }
                    other => other,
                });
            }
        };

        self.pause_before_commit();

        let repo = match git::open(&self.root) {
            Ok(repo) => repo,
            Err(err) => {
                edit.rollback();
                return Err(StoreError::Commit(err.to_string()));
            }
        };
        let outcome = match CommitWriter::new(&repo, &self.email_domain).commit(
            &edit.paths(),
            author,
            &message,
        ) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "commit failed, restoring working copy");
                edit.rollback();
                return Err(err);
            }
        };

        match outcome {
            CommitOutcome::Created(id) => {
                let recorded = git::to_oid(id)
                    .and_then(|oid| repo.find_commit(oid).map_err(StoreError::from))
                    .and_then(|commit| RevisionArena::describe(&repo, &commit))
                    .and_then(|record| arena.append(record));
                if let Err(err) = recorded {
                    warn!(error = %err, "rebuilding revision arena");
                    *arena = RevisionArena::load(&repo)?;
                }
                Ok(id)
            }
            CommitOutcome::Unchanged(Some(tip)) => Ok(tip),
            CommitOutcome::Unchanged(None) => {
                edit.rollback();
                Err(StoreError::Commit("nothing to commit".into()))
            }
        }
    }

    #[cfg(test)]
    fn pause_before_commit(&self) {
        if let Some(hook) = &self.before_commit {
            hook();
        }
    }

    #[cfg(not(test))]
    fn pause_before_commit(&self) {}

    /// Repository-relative keys and sizes of the regular files under `dir`.
    /// Hidden entries are skipped.
    fn scan(&self, dir: &str, max_depth: usize) -> StoreResult<Vec<(String, u64)>> {
        let base = self.root.join(dir);
        if !base.is_dir() {
            return Ok(Vec::new());
        }
        let mut found = Vec::new();
        let walker = WalkDir::new(&base)
            .min_depth(1)
            .max_depth(max_depth)
            .into_iter()
            .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'));
        for entry in walker {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let size = entry.metadata().map_err(io::Error::from)?.len();
            found.push((key, size));
        }
        Ok(found)
    }
}

fn message_or(message: &str, default: impl FnOnce() -> String) -> String {
    let message = message.trim();
    if message.is_empty() {
        default()
    } else {
        message.to_string()
    }
}

impl ContentStore for GitStore {
    fn get_page_at(&self, title: &str, revision: RevisionSpec) -> StoreResult<Page> {
        let title = self.resolver.check_title(title)?;
        let path = self.resolver.resolve(&title, Namespace::Pages)?;
        debug!(title = %title, revision = %revision, "get page");
        let (content, last_modified) =
            self.read_entity(&path, revision, || format!("page {title}"))?;
        Ok(Page {
            title,
            content,
            last_modified,
        })
    }

    fn put_page(
        &self,
        title: &str,
        content: &[u8],
        author: &Author,
        message: &str,
    ) -> StoreResult<RevisionId> {
        let title = self.resolver.check_title(title)?;
        let path = self.resolver.resolve(&title, Namespace::Pages)?;
        self.write(author, message, |edit| {
            let verb = if path.to_fs_path(&self.root).is_file() {
                "Update"
            } else {
                "Create"
            };
            edit.write(&path, content)?;
            Ok(format!("{verb} {title}"))
        })
    }

    fn delete_page(&self, title: &str, author: &Author, message: &str) -> StoreResult<RevisionId> {
        let title = self.resolver.check_title(title)?;
        let path = self.resolver.resolve(&title, Namespace::Pages)?;
        self.write(author, message, |edit| {
            if !path.to_fs_path(&self.root).is_file() {
                return Err(StoreError::NotFound(format!("page {title}")));
            }
            edit.remove(&path)?;
            Ok(format!("Delete {title}"))
        })
    }

    fn rename_page(
        &self,
        from: &str,
        to: &str,
        author: &Author,
        message: &str,
    ) -> StoreResult<RevisionId> {
        let from = self.resolver.check_title(from)?;
        let to = self.resolver.check_title(to)?;
        let from_path = self.resolver.resolve(&from, Namespace::Pages)?;
        let to_path = self.resolver.resolve(&to, Namespace::Pages)?;
        if from_path == to_path {
            return Err(StoreError::AlreadyExists(format!("page {to}")));
        }
        self.write(author, message, |edit| {
            let body = workdir::read_file(&from_path.to_fs_path(&self.root))?
                .ok_or_else(|| StoreError::NotFound(format!("page {from}")))?;
            if to_path.to_fs_path(&self.root).exists() {
                return Err(StoreError::AlreadyExists(format!("page {to}")));
            }
            edit.write(&to_path, &body)?;
            edit.remove(&from_path)?;
            Ok(format!("Rename {from} to {to}"))
        })
    }

    fn list_pages(&self) -> StoreResult<Vec<String>> {
        let _guard = self.state.shared()?;
        let mut titles: Vec<String> = self
            .scan(PAGES_DIR, usize::MAX)?
            .into_iter()
            .filter_map(|(key, _)| match self.resolver.classify(&key) {
                Some((Namespace::Pages, title)) => Some(title),
                _ => None,
            })
            .filter(|title| self.resolver.check_title(title).ok().as_deref() == Some(title))
            .collect();
        titles.sort();
        Ok(titles)
    }

    fn page_history(
        &self,
        title: &str,
        cursor: Option<Cursor>,
        page_size: usize,
    ) -> StoreResult<HistoryPage<LogEntry>> {
        let path = self.resolver.resolve(title, Namespace::Pages)?;
        let arena = self.state.shared()?;
        history::path_history(&arena, path.as_str(), cursor, page_size)
    }

    fn get_file_at(&self, name: &str, revision: RevisionSpec) -> StoreResult<File> {
        let name = self.resolver.check_file_name(name)?;
        let path = self.resolver.resolve(&name, Namespace::Files)?;
        debug!(file = %name, revision = %revision, "get file");
        let (content, last_modified) =
            self.read_entity(&path, revision, || format!("file {name}"))?;
        Ok(File {
            name,
            content,
            last_modified,
        })
    }

    fn put_file(
        &self,
        name: &str,
        content: &[u8],
        author: &Author,
        message: &str,
    ) -> StoreResult<RevisionId> {
        let name = self.resolver.check_file_name(name)?;
        let path = self.resolver.resolve(&name, Namespace::Files)?;
        self.write(author, message, |edit| {
            edit.write(&path, content)?;
            Ok(format!("Upload {name}"))
        })
    }

    fn delete_file(&self, name: &str, author: &Author, message: &str) -> StoreResult<RevisionId> {
        let name = self.resolver.check_file_name(name)?;
        let path = self.resolver.resolve(&name, Namespace::Files)?;
        self.write(author, message, |edit| {
            if !path.to_fs_path(&self.root).is_file() {
                return Err(StoreError::NotFound(format!("file {name}")));
            }
            edit.remove(&path)?;
            Ok(format!("Delete {name}"))
        })
    }

    fn list_files(&self) -> StoreResult<Vec<FileInfo>> {
        let arena = self.state.shared()?;
        let mut files: Vec<FileInfo> = self
            .scan(FILES_DIR, 1)?
            .into_iter()
            .filter_map(|(key, size)| match self.resolver.classify(&key) {
                Some((Namespace::Files, name)) => Some(FileInfo {
                    last_modified: arena
                        .last_touch(&key, arena.tip_index())
                        .map(RevisionRecord::last_modified),
                    name,
                    size,
                }),
                _ => None,
            })
            .collect();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    fn file_history(
        &self,
        name: &str,
        cursor: Option<Cursor>,
        page_size: usize,
    ) -> StoreResult<HistoryPage<LogEntry>> {
        let path = self.resolver.resolve(name, Namespace::Files)?;
        let arena = self.state.shared()?;
        history::path_history(&arena, path.as_str(), cursor, page_size)
    }

    fn recent_changes(
        &self,
        cursor: Option<Cursor>,
        page_size: usize,
    ) -> StoreResult<HistoryPage<RecentChange>> {
        let arena = self.state.shared()?;
        history::recent_changes(&arena, &self.resolver, cursor, page_size)
    }

    fn get_config(&self, name: &str) -> StoreResult<Vec<u8>> {
        let path = self.resolver.resolve(name, Namespace::Meta)?;
        let _guard = self.state.shared()?;
        self.vault.get(&self.root, name, &path)
    }

    fn put_config(&self, name: &str, data: &[u8]) -> StoreResult<()> {
        let path = self.resolver.resolve(name, Namespace::Meta)?;
        let _guard = self.state.exclusive()?;
        self.vault.put(&self.root, name, &path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn key() -> ConfigKey {
        ConfigKey::derive(b"store test key")
    }

    fn open(dir: &Path) -> GitStore {
        GitStore::open(&StoreConfig::new(dir), &key()).unwrap()
    }

    fn ada() -> Author {
        Author::new("Ada Lovelace")
    }

    // =========================================================================
    // Opening
    // =========================================================================

    #[test]
    fn open_initializes_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        assert!(dir.path().join(".git").is_dir());
        assert!(dir.path().join(".wiki").is_dir());
        assert_eq!(store.tip().unwrap(), None);
        assert!(store.list_pages().unwrap().is_empty());
        assert!(store.list_files().unwrap().is_empty());
        assert!(store.recent_changes(None, 10).unwrap().is_empty());
    }

    #[test]
    fn reopen_rebuilds_history() {
        let dir = tempfile::tempdir().unwrap();
        let first = open(dir.path());
        let r1 = first.put_page("Home", b"one", &ada(), "").unwrap();
        let r2 = first.put_page("Home", b"two", &ada(), "").unwrap();
        drop(first);

        let store = open(dir.path());
        assert_eq!(store.tip().unwrap(), Some(r2));
        let log = store.page_history("home", None, 10).unwrap();
        let revs: Vec<_> = log.entries.iter().map(|e| e.revision).collect();
        assert_eq!(revs, vec![r2, r1]);
        assert_eq!(log.entries[0].message, "Update home");
        assert_eq!(log.entries[1].message, "Create home");
    }

    // =========================================================================
    // Pages
    // =========================================================================

    #[test]
    fn put_then_get_page() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        let rev = store
            .put_page("Main_Page", b"# Welcome", &ada(), "first")
            .unwrap();

        let page = store.get_page("main page").unwrap();
        assert_eq!(page.title, "main page");
        assert_eq!(page.content, b"# Welcome");
        let lm = page.last_modified.expect("committed page has a revision");
        assert_eq!(lm.revision, rev);
        assert_eq!(lm.author, "Ada Lovelace");
        assert!(dir.path().join("pages/main page.md").is_file());
    }

    #[test]
    fn missing_page_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        let err = store.get_page("ghost").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref s) if s == "page ghost"));
    }

    #[test]
    fn identical_write_records_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        let rev = store.put_page("home", b"same", &ada(), "").unwrap();
        let again = store.put_page("HOME", b"same", &ada(), "").unwrap();
        assert_eq!(rev, again);
        assert_eq!(store.page_history("home", None, 10).unwrap().len(), 1);
    }

    #[test]
    fn read_at_past_revisions() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        let r1 = store.put_page("home", b"v1", &ada(), "").unwrap();
        let r2 = store.put_page("other", b"x", &ada(), "").unwrap();
        store.put_page("home", b"v2", &ada(), "").unwrap();

        let old = store.get_page_at("home", RevisionSpec::At(r1)).unwrap();
        assert_eq!(old.content, b"v1");
        assert_eq!(old.revision(), Some(r1));

        // "home" was last touched by r1 as of r2.
        let mid = store.get_page_at("home", RevisionSpec::At(r2)).unwrap();
        assert_eq!(mid.content, b"v1");
        assert_eq!(mid.revision(), Some(r1));

        let err = store
            .get_page_at("other", RevisionSpec::At(r1))
            .unwrap_err();
        assert!(err.is_not_found());

        let err = store
            .get_page_at("home", RevisionSpec::At(RevisionId::from_raw([9; 20])))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRevision(_)));
    }

    #[test]
    fn delete_page() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        let r1 = store.put_page("docs/intro", b"hi", &ada(), "").unwrap();
        store.delete_page("Docs/Intro", &ada(), "").unwrap();

        assert!(store.get_page("docs/intro").unwrap_err().is_not_found());
        assert!(!dir.path().join("pages/docs").exists());
        assert_eq!(
            store
                .get_page_at("docs/intro", RevisionSpec::At(r1))
                .unwrap()
                .content,
            b"hi"
        );
        let log = store.page_history("docs/intro", None, 10).unwrap();
        assert_eq!(log.entries[0].message, "Delete docs/intro");
    }

    #[test]
    fn delete_missing_page_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        store.put_page("home", b"x", &ada(), "").unwrap();
        let tip = store.tip().unwrap();
        let err = store.delete_page("ghost", &ada(), "").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref s) if s == "page ghost"));
        assert_eq!(store.tip().unwrap(), tip);
    }

    #[test]
    fn rename_is_one_revision() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        let before = store.put_page("draft", b"body", &ada(), "").unwrap();
        let rev = store.rename_page("draft", "Final", &ada(), "").unwrap();

        // The new title has no past before the rename.
        let err = store
            .get_page_at("final", RevisionSpec::At(before))
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            store
                .get_page_at("draft", RevisionSpec::At(before))
                .unwrap()
                .content,
            b"body"
        );

        assert!(store.get_page("draft").unwrap_err().is_not_found());
        let page = store.get_page("final").unwrap();
        assert_eq!(page.content, b"body");
        assert_eq!(page.revision(), Some(rev));

        let feed = store.recent_changes(None, 1).unwrap();
        assert_eq!(feed.len(), 2);
        assert!(feed.entries.iter().all(|c| c.revision == rev));
        assert!(feed
            .entries
            .iter()
            .all(|c| c.kind == quire_types::ChangeKind::Renamed));
        assert_eq!(feed.entries[0].message, "Rename draft to final");
    }

    #[test]
    fn rename_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        store.put_page("a", b"a", &ada(), "").unwrap();
        store.put_page("b", b"b", &ada(), "").unwrap();
        let tip = store.tip().unwrap();

        let err = store.rename_page("a", "B", &ada(), "").unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        let err = store.rename_page("ghost", "c", &ada(), "").unwrap_err();
        assert!(err.is_not_found());
        let err = store.rename_page("a", "A", &ada(), "").unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));

        assert_eq!(store.tip().unwrap(), tip);
        assert_eq!(store.get_page("a").unwrap().content, b"a");
        assert_eq!(store.get_page("b").unwrap().content, b"b");
    }

    #[test]
    fn list_pages_sorted_and_nested() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        for title in ["zeta", "Alpha", "docs/Setup"] {
            store.put_page(title, b"x", &ada(), "").unwrap();
        }
        assert_eq!(
            store.list_pages().unwrap(),
            vec!["alpha", "docs/setup", "zeta"]
        );
    }

    #[test]
    fn invalid_titles_never_touch_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path().join("wiki").as_path());
        for title in ["../escape", "/etc/passwd", ".wiki/users", ""] {
            let err = store.put_page(title, b"x", &ada(), "").unwrap_err();
            assert!(matches!(err, StoreError::InvalidPath { .. }), "{title}");
        }
        assert!(!dir.path().join("escape.md").exists());
        assert_eq!(store.tip().unwrap(), None);
    }

    #[test]
    fn page_history_paginates() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        let mut revs = Vec::new();
        for i in 0..5 {
            revs.push(store.put_page("log", format!("v{i}").as_bytes(), &ada(), "").unwrap());
            store.put_page("noise", format!("n{i}").as_bytes(), &ada(), "").unwrap();
        }
        revs.reverse();

        let mut seen = Vec::new();
        let mut cursor = None;
        loop {
            let page = store.page_history("log", cursor, 2).unwrap();
            seen.extend(page.entries.iter().map(|e| e.revision));
            // The cursor survives a trip through its text form.
            match Cursor::parse_token(&page.next_token()).unwrap() {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        assert_eq!(seen, revs);
    }

    #[test]
    fn cursor_survives_later_commits() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        let mut revs = Vec::new();
        for i in 0..5 {
            revs.push(store.put_page("log", format!("v{i}").as_bytes(), &ada(), "").unwrap());
        }
        revs.reverse();

        let first = store.page_history("log", None, 2).unwrap();
        let mut seen: Vec<_> = first.entries.iter().map(|e| e.revision).collect();
        store.put_page("log", b"late", &ada(), "").unwrap();

        let mut cursor = first.next;
        while let Some(next) = cursor {
            let page = store.page_history("log", Some(next), 2).unwrap();
            seen.extend(page.entries.iter().map(|e| e.revision));
            cursor = page.next;
        }
        assert_eq!(seen, revs);
    }

    #[test]
    fn each_revision_touches_only_its_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        store.put_page("a", b"a", &ada(), "").unwrap();
        // An untracked stray file must not sneak into the next revision.
        fs::write(dir.path().join("pages/stray.md"), b"stray").unwrap();
        store.put_page("b", b"b", &ada(), "").unwrap();

        let feed = store.recent_changes(None, 10).unwrap();
        let names: Vec<_> = feed.entries.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    // =========================================================================
    // Files
    // =========================================================================

    #[test]
    fn upload_and_list_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        let rev = store.put_file("logo.png", &[0u8; 300], &ada(), "").unwrap();
        store.put_file("a.txt", b"hello", &ada(), "").unwrap();

        let file = store.get_file("logo.png").unwrap();
        assert_eq!(file.size(), 300);
        assert_eq!(file.revision(), Some(rev));

        let listing = store.list_files().unwrap();
        let names: Vec<_> = listing.iter().map(|f| (f.name.as_str(), f.size)).collect();
        assert_eq!(names, vec![("a.txt", 5), ("logo.png", 300)]);
        assert!(listing.iter().all(|f| f.last_modified.is_some()));

        let log = store.file_history("logo.png", None, 10).unwrap();
        assert_eq!(log.entries[0].message, "Upload logo.png");
        let feed = store.recent_changes(None, 10).unwrap();
        assert!(feed
            .entries
            .iter()
            .all(|c| c.kind == quire_types::ChangeKind::Uploaded));
    }

    #[test]
    fn nested_file_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        let err = store.put_file("img/logo.png", b"x", &ada(), "").unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath { .. }));
    }

    #[test]
    fn delete_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        store.put_file("old.bin", b"1", &ada(), "").unwrap();
        store.delete_file("old.bin", &ada(), "").unwrap();
        assert!(store.get_file("old.bin").unwrap_err().is_not_found());
        assert!(store.list_files().unwrap().is_empty());
        let feed = store.recent_changes(None, 1).unwrap();
        assert_eq!(feed.entries[0].kind, quire_types::ChangeKind::Deleted);
    }

    // =========================================================================
    // Config blobs
    // =========================================================================

    #[test]
    fn config_blobs_stay_out_of_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        store.put_config("users", b"{\"ada\":{}}").unwrap();
        assert_eq!(store.get_config("users").unwrap(), b"{\"ada\":{}}");
        assert_eq!(store.tip().unwrap(), None);

        store.put_page("home", b"x", &ada(), "").unwrap();
        let feed = store.recent_changes(None, 10).unwrap();
        assert_eq!(feed.len(), 1);
        assert!(dir.path().join(".wiki/users.json.enc").is_file());
    }

    #[test]
    fn config_needs_the_same_key() {
        let dir = tempfile::tempdir().unwrap();
        open(dir.path()).put_config("settings", b"{}").unwrap();

        let again = open(dir.path());
        assert_eq!(again.get_config("settings").unwrap(), b"{}");

        let other = GitStore::open(&StoreConfig::new(dir.path()), &ConfigKey::derive(b"x")).unwrap();
        assert!(matches!(
            other.get_config("settings"),
            Err(StoreError::Decryption(_))
        ));
        assert!(other.get_config("missing").unwrap_err().is_not_found());
        assert!(other.get_config("../x").is_err());
    }

    #[test]
    fn tampered_config_blob_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        store.put_config("users", b"{\"ada\":{}}").unwrap();

        let path = dir.path().join(".wiki/users.json.enc");
        let mut sealed = fs::read(&path).unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        fs::write(&path, &sealed).unwrap();

        assert!(matches!(
            store.get_config("users"),
            Err(StoreError::Decryption(_))
        ));
    }

    // =========================================================================
    // Failure and concurrency
    // =========================================================================

    #[test]
    fn failed_commit_restores_working_copy() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(dir.path());
        store.put_page("home", b"v1", &ada(), "").unwrap();
        let tip = store.tip().unwrap();

        let repo = git2::Repository::open(dir.path()).unwrap();
        let head = repo.head().unwrap().name().unwrap().to_string();
        let lock = repo.path().join(format!("{head}.lock"));
        fs::write(&lock, b"").unwrap();

        let err = store.put_page("home", b"v2", &ada(), "").unwrap_err();
        assert!(matches!(err, StoreError::Commit(_)));
        let err = store.put_page("fresh", b"new", &ada(), "").unwrap_err();
        assert!(matches!(err, StoreError::Commit(_)));

        assert_eq!(store.get_page("home").unwrap().content, b"v1");
        assert!(!dir.path().join("pages/fresh.md").exists());
        assert_eq!(store.tip().unwrap(), tip);

        fs::remove_file(&lock).unwrap();
        store.put_page("home", b"v2", &ada(), "").unwrap();
        assert_eq!(store.page_history("home", None, 10).unwrap().len(), 2);
    }

    #[test]
    fn readers_never_see_partial_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(open(dir.path()));
        store.put_page("hot", b"v0", &ada(), "").unwrap();
        let done = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..3)
            .map(|_| {
                let store = Arc::clone(&store);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    let mut seen = HashSet::new();
                    while !done.load(Ordering::Acquire) {
                        let page = store.get_page("hot").unwrap();
                        let rev = page.revision().unwrap();
                        seen.insert((page.content, rev));
                    }
                    seen
                })
            })
            .collect();

        for i in 1..=20 {
            store
                .put_page("hot", format!("v{i}").as_bytes(), &ada(), "")
                .unwrap();
        }
        done.store(true, Ordering::Release);

        for reader in readers {
            for (content, rev) in reader.join().unwrap() {
                let at = store.get_page_at("hot", RevisionSpec::At(rev)).unwrap();
                assert_eq!(at.content, content);
            }
        }
        assert_eq!(store.page_history("hot", None, 100).unwrap().len(), 21);
    }

    #[test]
    fn lock_wait_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StoreConfig::new(dir.path());
        config.lock_timeout_ms = Some(20);
        let mut store = GitStore::open(&config, &key()).unwrap();
        store.before_commit = Some(Box::new(|| thread::sleep(Duration::from_millis(400))));
        let store = Arc::new(store);

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || store.put_page("slow", b"x", &ada(), ""))
        };
        thread::sleep(Duration::from_millis(100));
        let err = store.list_pages().unwrap_err();
        assert!(matches!(err, StoreError::LockTimeout(_)));

        writer.join().unwrap().unwrap();
        assert_eq!(store.list_pages().unwrap(), vec!["slow"]);
    }
}
