//! Error types for platform installers.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::installed::InstalledError;

/// Result type for install operations.
pub type InstallResult<T> = Result<T, InstallError>;

/// Errors raised while installing an artifact.
#[derive(Debug, Error)]
pub enum InstallError {
    /// Copying the artifact into place failed.
    #[error("failed to install {}: {source}", path.display())]
    CopyFailed { path: PathBuf, source: io::Error },

    /// The artifact was installed but could not be recorded.
    #[error("failed to record installation: {0}")]
    RecordFailed(#[from] InstalledError),

    /// The platform rejected the artifact.
    #[error("installation rejected: {0}")]
    Rejected(String),
}
