//! Update check errors.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::installed::InstalledError;

/// Why an explicit update check failed.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("catalog refresh failed: {0}")]
    Catalog(#[from] CatalogError),

    #[error("installed artifacts refresh failed: {0}")]
    Installed(#[from] InstalledError),
}
