//! Working-copy mutation with undo.

use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use crate::path::PhysicalPath;

/// Write `data` to `path` through a temp file and rename, so a reader
/// never observes a partial file.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let parent = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent)?;
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp = parent.join(format!(".tmp-{}-{seq}", std::process::id()));
    let mut file = fs::File::create(&tmp)?;
    file.write_all(data)?;
    file.sync_data()?;
    drop(file);
    fs::rename(&tmp, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}

/// Read a regular file, mapping "missing" and "is a directory" to `None`.
pub(crate) fn read_file(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => fs::read(path).map(Some),
        Ok(_) => Ok(None),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// A set of pending working-copy changes that can be undone.
///
/// Each touched path's prior content is captured on first touch.
/// [`Edit::rollback`] restores all of them.
pub(crate) struct Edit<'a> {
    root: &'a Path,
    saved: Vec<(PhysicalPath, Option<Vec<u8>>)>,
}

impl<'a> Edit<'a> {
    pub(crate) fn new(root: &'a Path) -> Self {
        Self {
            root,
            saved: Vec::new(),
        }
    }

    /// Paths touched so far, in first-touch order.
    pub(crate) fn paths(&self) -> Vec<PhysicalPath> {
        self.saved.iter().map(|(path, _)| path.clone()).collect()
    }

    pub(crate) fn write(&mut self, path: &PhysicalPath, data: &[u8]) -> io::Result<()> {
        self.capture(path)?;
        atomic_write(&path.to_fs_path(self.root), data)
    }

    pub(crate) fn remove(&mut self, path: &PhysicalPath) -> io::Result<()> {
        self.capture(path)?;
        let target = path.to_fs_path(self.root);
        match fs::remove_file(&target) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        self.prune_empty_dirs(&target);
        Ok(())
    }

    /// Restore every touched path to its captured state.
    pub(crate) fn rollback(self) {
        for (path, prior) in self.saved.iter().rev() {
            let target = path.to_fs_path(self.root);
            let result = match prior {
                Some(bytes) => atomic_write(&target, bytes),
                None => match fs::remove_file(&target) {
                    Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
                    _ => {
                        self.prune_empty_dirs(&target);
                        Ok(())
                    }
                },
            };
            if let Err(err) = result {
                warn!(path = %path, error = %err, "working copy rollback failed");
            }
        }
    }

    fn capture(&mut self, path: &PhysicalPath) -> io::Result<()> {
        if self.saved.iter().any(|(p, _)| p == path) {
            return Ok(());
        }
        let prior = read_file(&path.to_fs_path(self.root))?;
        self.saved.push((path.clone(), prior));
        Ok(())
    }

    /// Remove now-empty directories between `file` and its namespace
    /// directory. Git does not track directories, so nothing is lost.
    fn prune_empty_dirs(&self, file: &Path) {
        let mut dir: Option<PathBuf> = file.parent().map(Path::to_path_buf);
        while let Some(current) = dir {
            let depth = current
                .strip_prefix(self.root)
                .map(|rel| rel.components().count())
                .unwrap_or(0);
            if depth <= 1 || fs::remove_dir(&current).is_err() {
                break;
            }
            dir = current.parent().map(Path::to_path_buf);
        }
    }
}
