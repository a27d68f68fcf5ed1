//! Error types for the catalog repository.

use thiserror::Error;

use crate::remote::RemoteError;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur while refreshing catalog metadata.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The package does not exist in the catalog.
    #[error("package {package} not found in catalog")]
    PackageNotFound { package: String },

    /// The remote source could not be reached or returned garbage.
    #[error("catalog refresh failed: {0}")]
    Remote(#[from] RemoteError),
}

impl CatalogError {
    /// Build the error for a failed detail fetch of `package`.
    ///
    /// A remote "not found" becomes [`CatalogError::PackageNotFound`].
    pub fn for_package(package: &str, err: RemoteError) -> Self {
        if err.is_not_found() {
            Self::PackageNotFound {
                package: package.to_string(),
            }
        } else {
            Self::Remote(err)
        }
    }
}
