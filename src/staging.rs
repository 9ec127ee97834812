//! Per-request staging area for rendered page images.
//!
//! Each extraction request gets its own randomized subdirectory under
//! the configured staging root, so concurrent requests never collide.
//! The directory is removed when the [`StagingArea`] is dropped, which
//! covers every exit path of the pipeline.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A transient directory holding intermediate page images for one
/// extraction request.
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    /// Create a fresh staging subdirectory under `root`.
    pub fn create(root: &Path) -> io::Result<Self> {
        fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new().prefix("extract-").tempdir_in(root)?;
        tracing::debug!(path = %dir.path().display(), "created staging area");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for the staged image of one page.
    pub fn page_image_path(&self, index: usize) -> PathBuf {
        self.dir.path().join(format!("page-{index:04}.png"))
    }
}
