use std::fmt;

use serde::{Deserialize, Serialize};

/// The physical namespace a logical name lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// Wiki pages, addressed by title.
    Pages,
    /// Uploaded files, addressed by file name.
    Files,
    /// Store-private configuration blobs under the metadata directory.
    Meta,
}

impl Namespace {
    /// Human-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pages => "pages",
            Self::Files => "files",
            Self::Meta => "meta",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity recorded as the author of a write.
///
/// The name is supplied by the authentication layer and trusted verbatim.
/// Version-control signatures also need an e-mail address; when none is
/// given the store derives one from its configured domain.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: Option<String>,
}

impl Author {
    /// An author known only by user name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
        }
    }

    /// Attach an explicit e-mail address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.email {
            Some(email) => write!(f, "{} <{}>", self.name, email),
            None => f.write_str(&self.name),
        }
    }
}
