//! In-memory write-through catalog cache.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info};

use super::error::{CatalogError, CatalogResult};
use super::{CatalogRepository, CatalogSnapshot};
use crate::package::{ArtifactDetail, CatalogEntry};
use crate::remote::RemoteSource;

/// Catalog repository backed by a [`RemoteSource`] with an in-memory cache.
///
/// The listing feed only notifies subscribers when its contents actually
/// change, so repeated refreshes of an unchanged catalog do not trigger
/// downstream recomputation.
pub struct CachedCatalog {
    remote: Arc<dyn RemoteSource>,
    feed: watch::Sender<CatalogSnapshot>,
    details: RwLock<HashMap<String, ArtifactDetail>>,
}

impl CachedCatalog {
    /// Create an empty cache in front of `remote`.
    pub fn new(remote: Arc<dyn RemoteSource>) -> Self {
        let (feed, _) = watch::channel(CatalogSnapshot::new());
        Self {
            remote,
            feed,
            details: RwLock::new(HashMap::new()),
        }
    }

    /// Last fetched detail of a package, without network access.
    pub fn cached_artifact(&self, package_name: &str) -> Option<ArtifactDetail> {
        self.details.read().get(package_name).cloned()
    }

    /// Current catalog feed contents.
    pub fn snapshot(&self) -> CatalogSnapshot {
        self.feed.borrow().clone()
    }

    fn publish(&self, snapshot: CatalogSnapshot) {
        self.feed.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    /// Insert or replace one entry under the feed lock.
    fn upsert(&self, entry: CatalogEntry) {
        self.feed.send_if_modified(|current| {
            if current.get(&entry.package_name) == Some(&entry) {
                false
            } else {
                current.insert(entry.package_name.clone(), entry);
                true
            }
        });
    }

    fn evict(&self, package_name: &str) {
        self.feed
            .send_if_modified(|current| current.remove(package_name).is_some());
    }
}

impl CatalogRepository for CachedCatalog {
    fn refresh_artifact<'a>(
        &'a self,
        package_name: &'a str,
    ) -> BoxFuture<'a, CatalogResult<ArtifactDetail>> {
        async move {
            let result = self.remote.fetch_artifact(package_name).await;

            let detail = match result {
                Ok(detail) => detail,
                Err(e) => {
                    let err = CatalogError::for_package(package_name, e);
                    if matches!(err, CatalogError::PackageNotFound { .. }) {
                        debug!(package = package_name, "Package gone from catalog");
                        self.details.write().remove(package_name);
                        self.evict(package_name);
                    }
                    return Err(err);
                }
            };

            self.upsert(detail.to_catalog_entry());
            self.details
                .write()
                .insert(detail.package_name.clone(), detail.clone());

            debug!(
                package = package_name,
                versions = detail.versions.len(),
                "Refreshed artifact detail"
            );
            Ok(detail)
        }
        .boxed()
    }

    fn refresh_catalog(&self) -> BoxFuture<'_, CatalogResult<CatalogSnapshot>> {
        async move {
            let entries = self.remote.fetch_catalog().await?;
            let snapshot: CatalogSnapshot = entries
                .into_iter()
                .map(|entry| (entry.package_name.clone(), entry))
                .collect();

            self.details
                .write()
                .retain(|package, _| snapshot.contains_key(package));
            self.publish(snapshot.clone());

            info!(packages = snapshot.len(), "Catalog refreshed");
            Ok(snapshot)
        }
        .boxed()
    }

    fn watch_catalog(&self) -> watch::Receiver<CatalogSnapshot> {
        self.feed.subscribe()
    }
}
