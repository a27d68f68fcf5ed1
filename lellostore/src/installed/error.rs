//! Error types for the installed-artifacts repository.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for installed repository operations.
pub type InstalledResult<T> = Result<T, InstalledError>;

/// Errors raised while reading or writing the installed manifest.
#[derive(Debug, Error)]
pub enum InstalledError {
    /// The manifest could not be read.
    #[error("failed to read {}: {source}", path.display())]
    ReadFailed { path: PathBuf, source: io::Error },

    /// The manifest could not be written.
    #[error("failed to write {}: {source}", path.display())]
    WriteFailed { path: PathBuf, source: io::Error },

    /// The manifest is not valid JSON.
    #[error("failed to parse {}: {reason}", path.display())]
    ParseFailed { path: PathBuf, reason: String },
}
