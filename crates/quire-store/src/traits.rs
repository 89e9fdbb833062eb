use quire_types::{
    Author, Cursor, File, FileInfo, HistoryPage, LogEntry, Page, RecentChange, RevisionId,
    RevisionSpec,
};

use crate::error::StoreResult;

/// Revision-controlled storage for wiki pages, uploaded files, and
/// configuration blobs.
///
/// All implementations must satisfy these invariants:
/// - Every successful page or file mutation is exactly one revision, and
///   that revision touches exactly the affected paths.
/// - A failed mutation leaves the tip and the working copy as they were.
/// - A write that changes nothing records no revision and returns the tip.
/// - Readers never observe a half-applied write.
/// - Configuration blobs are never part of any revision.
pub trait ContentStore: Send + Sync {
    /// Current content of a page.
    fn get_page(&self, title: &str) -> StoreResult<Page> {
        self.get_page_at(title, RevisionSpec::Tip)
    }

    /// Page content as of `revision`.
    fn get_page_at(&self, title: &str, revision: RevisionSpec) -> StoreResult<Page>;

    /// Create or replace a page. An empty `message` gets a default.
    fn put_page(
        &self,
        title: &str,
        content: &[u8],
        author: &Author,
        message: &str,
    ) -> StoreResult<RevisionId>;

    fn delete_page(&self, title: &str, author: &Author, message: &str) -> StoreResult<RevisionId>;

    /// Move a page to a new title in a single revision.
    fn rename_page(
        &self,
        from: &str,
        to: &str,
        author: &Author,
        message: &str,
    ) -> StoreResult<RevisionId>;

    /// Normalized titles of all pages at the tip, sorted.
    fn list_pages(&self) -> StoreResult<Vec<String>>;

    fn page_history(
        &self,
        title: &str,
        cursor: Option<Cursor>,
        page_size: usize,
    ) -> StoreResult<HistoryPage<LogEntry>>;

    fn get_file(&self, name: &str) -> StoreResult<File> {
        self.get_file_at(name, RevisionSpec::Tip)
    }

    fn get_file_at(&self, name: &str, revision: RevisionSpec) -> StoreResult<File>;

    /// Create or replace an uploaded file.
    fn put_file(
        &self,
        name: &str,
        content: &[u8],
        author: &Author,
        message: &str,
    ) -> StoreResult<RevisionId>;

    fn delete_file(&self, name: &str, author: &Author, message: &str) -> StoreResult<RevisionId>;

    /// All files at the tip, sorted by name.
    fn list_files(&self) -> StoreResult<Vec<FileInfo>>;

    fn file_history(
        &self,
        name: &str,
        cursor: Option<Cursor>,
        page_size: usize,
    ) -> StoreResult<HistoryPage<LogEntry>>;

    /// Store-wide change feed, newest first.
    fn recent_changes(
        &self,
        cursor: Option<Cursor>,
        page_size: usize,
    ) -> StoreResult<HistoryPage<RecentChange>>;

    /// Decrypted contents of a configuration blob.
    fn get_config(&self, name: &str) -> StoreResult<Vec<u8>>;

    /// Encrypt and replace a configuration blob. Records no revision.
    fn put_config(&self, name: &str, data: &[u8]) -> StoreResult<()>;
}
