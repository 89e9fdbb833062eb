use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::revision::RevisionId;

/// Pagination token for history walks.
///
/// A cursor means "resume immediately after this revision". Walks that start
/// at the tip take no cursor at all, so callers pass `Option<Cursor>` and an
/// exhausted walk returns `None` as its continuation.
///
/// The token form is opaque to callers; it round-trips through
/// [`Cursor::to_token`] and [`Cursor::parse_token`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor {
    after: RevisionId,
}

impl Cursor {
    /// Cursor that resumes after `revision`.
    pub fn after(revision: RevisionId) -> Self {
        Self { after: revision }
    }

    /// The revision the walk resumes after.
    pub fn revision(&self) -> RevisionId {
        self.after
    }

    /// Encode as an opaque token.
    pub fn to_token(&self) -> String {
        self.after.to_hex()
    }

    /// Decode a token. An empty token means "start at the tip".
    pub fn parse_token(token: &str) -> Result<Option<Self>, TypeError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }
        RevisionId::from_hex(token)
            .map(|after| Some(Self { after }))
            .map_err(|_| TypeError::InvalidCursor(token.to_string()))
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_token())
    }
}

/// One page of a history walk plus its continuation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPage<T> {
    pub entries: Vec<T>,
    /// `None` once the walk is exhausted.
    pub next: Option<Cursor>,
}

impl<T> HistoryPage<T> {
    /// An empty, exhausted page.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            next: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if following pages exist.
    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }

    /// The continuation token, empty when exhausted.
    pub fn next_token(&self) -> String {
        self.next.map(|c| c.to_token()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision::REVISION_ID_LEN;

    #[test]
    fn empty_token_starts_at_tip() {
        assert_eq!(Cursor::parse_token("").unwrap(), None);
        assert_eq!(Cursor::parse_token("   ").unwrap(), None);
    }

    #[test]
    fn token_roundtrip() {
        let cursor = Cursor::after(RevisionId::from_raw([9; REVISION_ID_LEN]));
        let parsed = Cursor::parse_token(&cursor.to_token()).unwrap();
        assert_eq!(parsed, Some(cursor));
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert_eq!(
            Cursor::parse_token("page-2").unwrap_err(),
            TypeError::InvalidCursor("page-2".into())
        );
    }

    #[test]
    fn exhausted_page_has_empty_token() {
        let page: HistoryPage<u8> = HistoryPage::empty();
        assert!(!page.has_more());
        assert_eq!(page.next_token(), "");
    }
}
