//! Artifact version types.

use std::fmt;

/// One published release of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactVersion {
    /// Monotonically increasing release number.
    pub version_code: u64,

    /// Human-readable version label (e.g., "1.4.2").
    pub version_name: String,

    /// Size of the artifact binary in bytes. Zero when unknown.
    pub size_bytes: u64,

    /// Expected SHA-256 digest in hex.
    ///
    /// `None` means the server published no digest and the artifact cannot
    /// be verified.
    pub sha256: Option<String>,

    /// Minimum platform version required to run the artifact.
    pub min_platform_version: u32,

    /// Upload timestamp as reported by the server.
    pub uploaded_at: String,
}

impl ArtifactVersion {
    /// Create a version with the required identity fields.
    ///
    /// Remaining fields default to "unknown" and can be filled with the
    /// `with_*` builders.
    pub fn new(version_code: u64, version_name: impl Into<String>) -> Self {
        Self {
            version_code,
            version_name: version_name.into(),
            size_bytes: 0,
            sha256: None,
            min_platform_version: 0,
            uploaded_at: String::new(),
        }
    }

    /// Set the artifact size.
    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    /// Set the expected SHA-256 digest.
    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.sha256 = Some(sha256.into());
        self
    }

    /// Set the minimum platform version.
    pub fn with_min_platform_version(mut self, min: u32) -> Self {
        self.min_platform_version = min;
        self
    }

    /// Set the upload timestamp.
    pub fn with_uploaded_at(mut self, uploaded_at: impl Into<String>) -> Self {
        self.uploaded_at = uploaded_at.into();
        self
    }

    /// Whether this version carries a digest that can be verified.
    pub fn is_verifiable(&self) -> bool {
        self.sha256.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Summary used by catalog listings.
    pub fn summary(&self) -> VersionSummary {
        VersionSummary {
            version_code: self.version_code,
            version_name: self.version_name.clone(),
            size_bytes: self.size_bytes,
        }
    }
}

impl fmt::Display for ArtifactVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.version_name, self.version_code)
    }
}

/// The subset of a version shown in catalog listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSummary {
    pub version_code: u64,
    pub version_name: String,
    pub size_bytes: u64,
}
