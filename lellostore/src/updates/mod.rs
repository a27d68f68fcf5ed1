//! Update detection.
//!
//! An update exists for a package when it is both installed and in the
//! catalog, and the catalog's latest version code is strictly greater than
//! the installed one. The list is derived data: [`UpdateDetector`] recomputes
//! it in full whenever either input feed changes.

mod detector;
mod error;

pub use detector::UpdateDetector;
pub use error::UpdateError;

use std::fmt;

use crate::catalog::CatalogSnapshot;
use crate::installed::InstalledSnapshot;
use crate::package::CatalogEntry;

/// A newer catalog version of an installed package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableUpdate {
    /// Catalog entry carrying the latest version.
    pub artifact: CatalogEntry,
    pub installed_version_code: u64,
    pub installed_version_name: String,
}

impl AvailableUpdate {
    pub fn package_name(&self) -> &str {
        &self.artifact.package_name
    }

    /// Version code to download for this update.
    pub fn available_version_code(&self) -> u64 {
        self.artifact
            .latest_version_code()
            .unwrap_or(self.installed_version_code)
    }

    pub fn available_version_name(&self) -> &str {
        self.artifact
            .latest_version
            .as_ref()
            .map(|v| v.version_name.as_str())
            .unwrap_or_default()
    }
}

impl fmt::Display for AvailableUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({}) -> {} ({})",
            self.package_name(),
            self.installed_version_name,
            self.installed_version_code,
            self.available_version_name(),
            self.available_version_code()
        )
    }
}

/// Join the catalog with the installed set.
///
/// Output is ordered by package name.
pub fn compute_updates(
    catalog: &CatalogSnapshot,
    installed: &InstalledSnapshot,
) -> Vec<AvailableUpdate> {
    installed
        .iter()
        .filter_map(|(package, local)| {
            let entry = catalog.get(package)?;
            let latest = entry.latest_version_code()?;
            (latest > local.version_code).then(|| AvailableUpdate {
                artifact: entry.clone(),
                installed_version_code: local.version_code,
                installed_version_name: local.version_name.clone(),
            })
        })
        .collect()
}
