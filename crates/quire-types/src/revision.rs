use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Length in bytes of a revision identifier (a git object id).
pub const REVISION_ID_LEN: usize = 20;

/// Identifier of one committed revision.
///
/// A `RevisionId` is the object id of the commit that recorded the revision.
/// Revisions are immutable, so the same id always names the same snapshot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RevisionId([u8; REVISION_ID_LEN]);

impl RevisionId {
    /// Wrap raw object id bytes.
    pub const fn from_raw(bytes: [u8; REVISION_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Copy an id out of a byte slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        if bytes.len() != REVISION_ID_LEN {
            return Err(TypeError::InvalidLength {
                expected: REVISION_ID_LEN,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; REVISION_ID_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// The raw 20-byte id.
    pub fn as_bytes(&self) -> &[u8; REVISION_ID_LEN] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 7 characters, like `git log --oneline`).
    pub fn short_hex(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(7);
        hex
    }

    /// Parse from a 40-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RevisionId({})", self.short_hex())
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for RevisionId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for RevisionId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RevisionId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Which revision a read should observe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RevisionSpec {
    /// The current tip, read from the working copy.
    #[default]
    Tip,
    /// A specific committed revision.
    At(RevisionId),
}

impl RevisionSpec {
    /// Parse a caller-supplied revision string.
    ///
    /// Empty input, `HEAD` and `tip` (any case) select the tip; a full
    /// 40-character hex id selects that revision.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("head") || s.eq_ignore_ascii_case("tip") {
            return Ok(Self::Tip);
        }
        RevisionId::from_hex(s)
            .map(Self::At)
            .map_err(|_| TypeError::InvalidRevision(s.to_string()))
    }

    /// Returns `true` for the symbolic tip.
    pub fn is_tip(&self) -> bool {
        matches!(self, Self::Tip)
    }
}

impl From<RevisionId> for RevisionSpec {
    fn from(id: RevisionId) -> Self {
        Self::At(id)
    }
}

impl fmt::Display for RevisionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tip => write!(f, "HEAD"),
            Self::At(id) => write!(f, "{id}"),
        }
    }
}
