//! Download error taxonomy and the caller-facing start result.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::installer::InstallError;
use crate::package::PackageNameError;

/// Result type for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

/// Reason shown to callers when a package already has an active download.
pub const ALREADY_IN_PROGRESS: &str = "Download already in progress";

/// Everything that can end a download other than success.
///
/// The specific cause is carried end to end; [`StartResult`] collapses it to
/// a short user-facing reason only at the presentation boundary.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Another pipeline for the package is registered.
    #[error("download of {package} is already in progress")]
    AlreadyInProgress { package: String },

    /// The package identifier is malformed.
    #[error(transparent)]
    InvalidPackage(#[from] PackageNameError),

    /// The catalog has no such package.
    #[error("package {package} not found in catalog")]
    PackageNotFound { package: String },

    /// The catalog has the package but not the requested version.
    #[error("version {version_code} of {package} not found in catalog")]
    VersionNotFound { package: String, version_code: u64 },

    /// Network failure while fetching metadata or the binary.
    #[error("transport failure for {package}: {reason}")]
    Transport { package: String, reason: String },

    /// Local I/O failure on the staging file.
    #[error("staging failure at {}: {source}", path.display())]
    Staging { path: PathBuf, source: io::Error },

    /// The staged artifact does not match its published digest.
    #[error("checksum mismatch for {package}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        package: String,
        expected: String,
        actual: String,
    },

    /// The installer lacks permission; the staged file was kept for a retry.
    #[error("install permission required for {package} (staged at {})", staged.display())]
    InstallPermissionRequired { package: String, staged: PathBuf },

    /// The installer failed.
    #[error("installation of {package} failed: {source}")]
    InstallFailed {
        package: String,
        #[source]
        source: InstallError,
    },

    /// The download was cancelled.
    #[error("download of {package} was cancelled")]
    Cancelled { package: String },
}

impl DownloadError {
    /// Map a catalog failure during metadata resolution.
    pub fn from_catalog(package: &str, err: CatalogError) -> Self {
        match err {
            CatalogError::PackageNotFound { package } => Self::PackageNotFound { package },
            CatalogError::Remote(e) => Self::transport(package, e),
        }
    }

    pub(crate) fn transport(package: &str, reason: impl fmt::Display) -> Self {
        Self::Transport {
            package: package.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn staging(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Staging {
            path: path.into(),
            source,
        }
    }

    /// Whether this is a cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Short user-facing reason.
    pub fn short_reason(&self) -> &'static str {
        match self {
            Self::AlreadyInProgress { .. } => ALREADY_IN_PROGRESS,
            Self::InvalidPackage(_) => "Invalid package name",
            Self::PackageNotFound { .. } => "Package not found",
            Self::VersionNotFound { .. } => "Version not found",
            Self::Transport { .. } => "Network error",
            Self::Staging { .. } => "Storage error",
            Self::IntegrityMismatch { .. } => "Checksum verification failed",
            Self::InstallPermissionRequired { .. } => "Install permission required",
            Self::InstallFailed { .. } => "Installation failed",
            Self::Cancelled { .. } => "Download cancelled",
        }
    }
}

/// Caller-facing outcome of a start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartResult {
    Success,
    Cancelled,
    Failed(String),
}

impl<T> From<DownloadResult<T>> for StartResult {
    fn from(result: DownloadResult<T>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(e) if e.is_cancelled() => Self::Cancelled,
            Err(e) => Self::Failed(e.short_reason().to_string()),
        }
    }
}

impl fmt::Display for StartResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("Success"),
            Self::Cancelled => f.write_str("Cancelled"),
            Self::Failed(reason) => write!(f, "Failed: {}", reason),
        }
    }
}
