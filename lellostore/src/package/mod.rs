//! Artifact catalog types shared by every subsystem.
//!
//! # Overview
//!
//! - **PackageName**: validated reverse-domain identifier (`com.example.app`)
//! - **ArtifactVersion**: one published release of a package (version code,
//!   size, SHA-256 digest)
//! - **ArtifactDetail**: a package with its full version list
//! - **CatalogEntry**: a package as listed in the catalog, with its latest
//!   version summary
//! - **InstalledArtifact**: a package version present on this machine
//!
//! # Type Hierarchy
//!
//! ```text
//! ArtifactDetail                    CatalogEntry
//! ├── package_name                  ├── package_name
//! ├── name / description            ├── name / description
//! └── versions: Vec<ArtifactVersion>└── latest_version: Option<VersionSummary>
//! ```
//!
//! An `ArtifactDetail` can always be folded into a `CatalogEntry`; the
//! reverse needs a detail fetch.

mod artifact;
mod installed;
mod name;
mod naming;
mod version;

pub use artifact::{ArtifactDetail, CatalogEntry};
pub use installed::InstalledArtifact;
pub use name::{PackageName, PackageNameError};
pub use naming::{installed_filename, staging_filename};
pub use version::{ArtifactVersion, VersionSummary};
