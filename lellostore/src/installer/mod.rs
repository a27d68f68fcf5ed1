//! Platform installer capability.
//!
//! The download pipeline hands verified artifacts to a [`PlatformInstaller`]
//! and never touches platform specifics itself. An installer may refuse with
//! [`InstallOutcome::PermissionRequired`], in which case the pipeline asks it
//! to start remediation via [`PlatformInstaller::request_permission`] and
//! keeps the staged file for a later retry.

mod directory;
mod error;

pub use directory::{DirectoryInstaller, PermissionCallback};
pub use error::{InstallError, InstallResult};

use std::path::PathBuf;

use futures::future::BoxFuture;

use crate::package::{ArtifactVersion, InstalledArtifact};

/// A downloaded and verified artifact waiting to be installed.
#[derive(Debug, Clone)]
pub struct StagedArtifact {
    pub package_name: String,
    pub version: ArtifactVersion,
    pub path: PathBuf,
}

/// Result of an install attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The artifact is installed.
    Installed(InstalledArtifact),

    /// The installer lacks the permission it needs; nothing was installed.
    PermissionRequired,
}

/// Installs verified artifacts on the host platform.
pub trait PlatformInstaller: Send + Sync {
    /// Try to install a staged artifact.
    ///
    /// The staged file is only read; the caller owns its lifetime.
    fn attempt_install<'a>(
        &'a self,
        staged: &'a StagedArtifact,
    ) -> BoxFuture<'a, InstallResult<InstallOutcome>>;

    /// Start whatever remediation grants the missing install permission
    /// (e.g., prompting the user).
    fn request_permission(&self);
}
