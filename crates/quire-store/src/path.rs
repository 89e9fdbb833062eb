//! Logical-name to physical-path resolution.
//!
//! Every name that reaches the filesystem or the repository index passes
//! through [`PathResolver::resolve`]. A resolved path is always relative,
//! uses `/` separators, and stays inside its namespace directory.

use std::fmt;
use std::path::{Path, PathBuf};

use quire_types::Namespace;

use crate::error::{StoreError, StoreResult};

/// Directory holding page sources.
pub const PAGES_DIR: &str = "pages";
/// Directory holding uploaded files.
pub const FILES_DIR: &str = "files";
/// Extension appended to page titles.
pub const PAGE_EXT: &str = ".md";
/// Extension appended to config blob names.
pub const CONFIG_EXT: &str = ".json.enc";

const MAX_SEGMENT_BYTES: usize = 255;

/// A repository-relative path with `/` separators.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhysicalPath(String);

impl PhysicalPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    /// Absolute location under `root`.
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        self.0.split('/').fold(root.to_path_buf(), |acc, seg| acc.join(seg))
    }
}

impl fmt::Display for PhysicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical form of a page title.
///
/// Backslashes become `/`, runs of whitespace and underscores become one
/// space, each segment is trimmed, empty segments are dropped, and the
/// result is lower-cased. Applying it twice changes nothing.
pub fn normalize_title(raw: &str) -> String {
    let lowered = raw.to_lowercase().replace('\\', "/");
    lowered
        .split('/')
        .map(|segment| {
            segment
                .split(|c: char| c.is_whitespace() || c == '_')
                .filter(|word| !word.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Maps logical names to physical paths and back.
#[derive(Clone, Debug)]
pub struct PathResolver {
    meta_dir: String,
}

impl PathResolver {
    pub fn new(meta_dir: impl Into<String>) -> Self {
        Self {
            meta_dir: meta_dir.into(),
        }
    }

    pub fn meta_dir(&self) -> &str {
        &self.meta_dir
    }

    /// Resolve a logical name in `namespace` to its physical path.
    ///
    /// Page titles are normalized first. Files are a flat namespace. Config
    /// names are restricted to `[a-z0-9_-]+`.
    pub fn resolve(&self, name: &str, namespace: Namespace) -> StoreResult<PhysicalPath> {
        match namespace {
            Namespace::Pages => {
                let title = self.check_title(name)?;
                Ok(PhysicalPath(format!("{PAGES_DIR}/{title}{PAGE_EXT}")))
            }
            Namespace::Files => {
                let file = self.check_file_name(name)?;
                Ok(PhysicalPath(format!("{FILES_DIR}/{file}")))
            }
            Namespace::Meta => {
                check_config_name(name)?;
                Ok(PhysicalPath(format!("{}/{name}{CONFIG_EXT}", self.meta_dir)))
            }
        }
    }

    /// Validate and normalize a page title.
    pub fn check_title(&self, raw: &str) -> StoreResult<String> {
        reject_rooted(raw)?;
        let title = normalize_title(raw);
        if title.is_empty() {
            return Err(StoreError::invalid_path(raw, "empty title"));
        }
        let segments: Vec<&str> = title.split('/').collect();
        let last = segments.len() - 1;
        for (i, segment) in segments.iter().enumerate() {
            self.check_segment(raw, segment)?;
            if i < last && segment.ends_with(PAGE_EXT) {
                return Err(StoreError::invalid_path(
                    raw,
                    format!("segment {segment:?} collides with a page file"),
                ));
            }
        }
        Ok(title)
    }

    /// Validate a file name. File names are case-preserving and flat.
    pub fn check_file_name(&self, raw: &str) -> StoreResult<String> {
        reject_rooted(raw)?;
        let name = raw.trim();
        if name.is_empty() {
            return Err(StoreError::invalid_path(raw, "empty file name"));
        }
        if name.contains(['/', '\\']) {
            return Err(StoreError::invalid_path(
                raw,
                "file names may not contain directory separators",
            ));
        }
        self.check_segment(raw, name)?;
        Ok(name.to_string())
    }

    /// Map a repository-relative path back to its namespace and logical name.
    pub fn classify(&self, path: &str) -> Option<(Namespace, String)> {
        if let Some(rest) = path.strip_prefix(PAGES_DIR).and_then(|p| p.strip_prefix('/')) {
            let title = rest.strip_suffix(PAGE_EXT)?;
            return (!title.is_empty()).then(|| (Namespace::Pages, title.to_string()));
        }
        if let Some(rest) = path.strip_prefix(FILES_DIR).and_then(|p| p.strip_prefix('/')) {
            return (!rest.is_empty() && !rest.contains('/'))
                .then(|| (Namespace::Files, rest.to_string()));
        }
        let rest = path
            .strip_prefix(self.meta_dir.as_str())
            .and_then(|p| p.strip_prefix('/'))?;
        let name = rest.strip_suffix(CONFIG_EXT)?;
        (!name.is_empty() && !name.contains('/')).then(|| (Namespace::Meta, name.to_string()))
    }

    fn check_segment(&self, raw: &str, segment: &str) -> StoreResult<()> {
        match segment {
            "." => return Err(StoreError::invalid_path(raw, "current-directory segment")),
            ".." => return Err(StoreError::invalid_path(raw, "parent-directory segment")),
            _ => {}
        }
        if segment.starts_with('.') {
            return Err(StoreError::invalid_path(raw, "hidden segment"));
        }
        if segment.eq_ignore_ascii_case(&self.meta_dir) {
            return Err(StoreError::invalid_path(raw, "reserved name"));
        }
        if segment.chars().any(char::is_control) {
            return Err(StoreError::invalid_path(raw, "control character"));
        }
        if segment.len() > MAX_SEGMENT_BYTES {
            return Err(StoreError::invalid_path(raw, "segment too long"));
        }
        Ok(())
    }
}

fn reject_rooted(raw: &str) -> StoreResult<()> {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('/') || trimmed.starts_with('\\') {
        return Err(StoreError::invalid_path(raw, "absolute path"));
    }
    let bytes = trimmed.as_bytes();
    let drive = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    if drive && matches!(bytes.get(2), None | Some(b'/') | Some(b'\\')) {
        return Err(StoreError::invalid_path(raw, "drive prefix"));
    }
    Ok(())
}

fn check_config_name(name: &str) -> StoreResult<()> {
    if name.is_empty() {
        return Err(StoreError::invalid_path(name, "empty config name"));
    }
    let valid = name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-');
    if !valid {
        return Err(StoreError::invalid_path(
            name,
            "config names are limited to [a-z0-9_-]",
        ));
    }
    Ok(())
}
