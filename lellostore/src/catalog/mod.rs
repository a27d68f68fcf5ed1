//! Catalog repository.
//!
//! The repository owns the locally known view of the remote catalog and
//! publishes it as a watch feed, which the update detector subscribes to.
//! Every network refresh writes through to the feed.

mod cached;
mod error;

pub use cached::CachedCatalog;
pub use error::{CatalogError, CatalogResult};

use std::collections::BTreeMap;

use futures::future::BoxFuture;
use tokio::sync::watch;

use crate::package::{ArtifactDetail, CatalogEntry};

/// Catalog feed contents: package name → catalog entry.
pub type CatalogSnapshot = BTreeMap<String, CatalogEntry>;

/// Access to catalog metadata.
pub trait CatalogRepository: Send + Sync {
    /// Fetch the full detail of one package and write it through to the feed.
    fn refresh_artifact<'a>(
        &'a self,
        package_name: &'a str,
    ) -> BoxFuture<'a, CatalogResult<ArtifactDetail>>;

    /// Re-fetch the whole catalog listing and publish it.
    fn refresh_catalog(&self) -> BoxFuture<'_, CatalogResult<CatalogSnapshot>>;

    /// Subscribe to the catalog feed.
    fn watch_catalog(&self) -> watch::Receiver<CatalogSnapshot>;
}
