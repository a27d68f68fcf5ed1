//! Scoped staging files.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// A staging file that is deleted when dropped unless explicitly retained.
///
/// Every pipeline exit path (errors, cancellation, task abort) goes through
/// `Drop`, so partial or unverified content never outlives its pipeline.
#[derive(Debug)]
pub(crate) struct StagingFile {
    path: PathBuf,
    retained: bool,
}

impl StagingFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self {
            path,
            retained: false,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the file on disk after drop.
    pub(crate) fn retain(&mut self) {
        self.retained = true;
    }

    /// Delete the file now.
    pub(crate) fn discard(&mut self) -> io::Result<()> {
        self.retained = false;
        remove_if_exists(&self.path)
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        if self.retained {
            debug!(path = %self.path.display(), "Keeping staged file");
            return;
        }
        if let Err(e) = remove_if_exists(&self.path) {
            debug!(path = %self.path.display(), error = %e, "Failed to remove staged file");
        }
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
