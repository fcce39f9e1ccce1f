//! Private staging directories and the best-effort filesystem moves that
//! carry a file through them.
//!
//! Every helper here reports failure to its caller instead of propagating it:
//! the dispatcher only uses the outcome to decide whether to skip a file.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

/// The `src` and `dst` directories under the work root.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
    src_dir: PathBuf,
    dst_dir: PathBuf,
}

impl StagingArea {
    pub fn new(work_root: &Path) -> Self {
        Self {
            root: work_root.to_path_buf(),
            src_dir: work_root.join("src"),
            dst_dir: work_root.join("dst"),
        }
    }

    /// Create both staging directories.
    ///
    /// Existing directories count as success. Returns false if either could
    /// not be created; the failure is logged but otherwise left for the
    /// caller to act on.
    pub fn prepare(&self) -> bool {
        let src_ok = safe_mkdir(&self.src_dir);
        let dst_ok = safe_mkdir(&self.dst_dir);
        src_ok && dst_ok
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn src_dir(&self) -> &Path {
        &self.src_dir
    }

    /// Where a claimed file waits while its worker runs.
    pub fn src_path(&self, name: &OsStr) -> PathBuf {
        self.src_dir.join(name)
    }

    /// Where the worker writes its output.
    pub fn dst_path(&self, name: &OsStr) -> PathBuf {
        self.dst_dir.join(name)
    }
}

/// Create a single directory, treating an existing directory as success.
pub fn safe_mkdir(path: &Path) -> bool {
    match std::fs::create_dir(path) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => true,
        Err(e) => {
            tracing::warn!("Failed to create directory {:?}: {}", path, e);
            false
        }
    }
}

/// Atomically move `src` to `dst`.
pub fn safe_rename(src: &Path, dst: &Path) -> io::Result<()> {
    std::fs::rename(src, dst)
}

/// Move `src` to `dst` unless something already sits at `dst`.
///
/// Used to hand a claimed file back to the input directory, where a newer
/// file of the same name must not be overwritten.
pub fn safe_rename_new(src: &Path, dst: &Path) -> io::Result<()> {
    if dst.symlink_metadata().is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{:?} already exists", dst),
        ));
    }
    std::fs::rename(src, dst)
}

/// Remove a staged file. A file that is already gone counts as removed.
pub fn safe_remove(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
