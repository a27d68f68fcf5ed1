//! Installed artifact type.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A package version present on this machine.
///
/// Persisted in the installed-artifacts manifest, so field names are part of
/// the on-disk format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledArtifact {
    pub package_name: String,
    pub version_code: u64,
    pub version_name: String,

    /// Where the installed artifact lives.
    pub path: PathBuf,

    /// RFC 3339 install timestamp.
    #[serde(default)]
    pub installed_at: String,
}

impl InstalledArtifact {
    /// Create a record stamped with the current time.
    pub fn new(
        package_name: impl Into<String>,
        version_code: u64,
        version_name: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            version_code,
            version_name: version_name.into(),
            path: path.into(),
            installed_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Path to the installed artifact.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
