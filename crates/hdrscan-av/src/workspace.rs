//! Scratch directories for probe runs.
//!
//! A [`Workspace`] owns a uniquely named directory under the configured temp
//! root. Intermediate artifacts (elementary-stream samples, RPU payloads) go
//! inside it and the whole directory is removed when the workspace is dropped,
//! whichever way the probe run ends.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::Result;

/// Prefix shared by every scratch directory, used to find orphans.
const SCRATCH_PREFIX: &str = "hdrscan-";

/// Per-run scratch directory, removed on drop.
#[derive(Debug)]
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    /// Create a new scratch directory under `root`, creating `root` if needed.
    pub fn new_in(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        let temp_dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(root)?;
        Ok(Self { temp_dir })
    }

    /// Path to the scratch directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path for a named temporary file inside the workspace.
    pub fn temp_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }
}

/// Remove scratch directories left behind by a previous process.
///
/// Only entries carrying the scratch prefix are touched; everything else in
/// `root` is left alone. Returns the number of directories removed.
pub fn purge_stale(root: &Path) -> Result<usize> {
    if !root.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(SCRATCH_PREFIX) || !entry.file_type()?.is_dir() {
            continue;
        }
        match std::fs::remove_dir_all(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(path = %entry.path().display(), "failed to remove stale scratch dir: {e}"),
        }
    }
    Ok(removed)
}
