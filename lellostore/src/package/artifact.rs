//! Catalog-level artifact types.

use std::fmt;

use super::version::{ArtifactVersion, VersionSummary};

/// A package together with every published version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDetail {
    pub package_name: String,
    pub name: String,
    pub description: Option<String>,
    pub versions: Vec<ArtifactVersion>,
}

impl ArtifactDetail {
    /// Create a detail record with no versions.
    pub fn new(package_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            name: name.into(),
            description: None,
            versions: Vec::new(),
        }
    }

    /// Add a version (builder pattern).
    pub fn with_version(mut self, version: ArtifactVersion) -> Self {
        self.versions.push(version);
        self
    }

    /// Find a specific version by its code.
    pub fn find_version(&self, version_code: u64) -> Option<&ArtifactVersion> {
        self.versions.iter().find(|v| v.version_code == version_code)
    }

    /// The version with the highest version code.
    pub fn latest_version(&self) -> Option<&ArtifactVersion> {
        self.versions.iter().max_by_key(|v| v.version_code)
    }

    /// Fold this detail into a catalog listing entry.
    pub fn to_catalog_entry(&self) -> CatalogEntry {
        CatalogEntry {
            package_name: self.package_name.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            latest_version: self.latest_version().map(ArtifactVersion::summary),
        }
    }
}

/// A package as it appears in the catalog listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub package_name: String,
    pub name: String,
    pub description: Option<String>,
    pub latest_version: Option<VersionSummary>,
}

impl CatalogEntry {
    /// Version code of the latest published release, if any.
    pub fn latest_version_code(&self) -> Option<u64> {
        self.latest_version.as_ref().map(|v| v.version_code)
    }
}

impl fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.latest_version {
            Some(v) => write!(f, "{} v{}", self.package_name, v.version_name),
            None => write!(f, "{} (no releases)", self.package_name),
        }
    }
}
