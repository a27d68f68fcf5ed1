//! Reactive catalog × installed join.
//!
//! ```text
//! watch_catalog() ───┐
//!                    ├──► combinator task ──► compute_updates ──► available_updates()
//! watch_installed() ─┘
//! ```

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use super::error::UpdateError;
use super::{compute_updates, AvailableUpdate};
use crate::catalog::{CatalogRepository, CatalogSnapshot};
use crate::installed::{InstalledRepository, InstalledSnapshot};

/// Publishes the list of available updates.
///
/// The combinator task stops when `shutdown` is cancelled or the detector is
/// dropped.
pub struct UpdateDetector {
    catalog: Arc<dyn CatalogRepository>,
    installed: Arc<dyn InstalledRepository>,
    updates: Arc<watch::Sender<Vec<AvailableUpdate>>>,
    _task: DropGuard,
}

impl UpdateDetector {
    /// Compute the initial list from the current feeds and start listening.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        catalog: Arc<dyn CatalogRepository>,
        installed: Arc<dyn InstalledRepository>,
        shutdown: CancellationToken,
    ) -> Self {
        let mut catalog_rx = catalog.watch_catalog();
        let mut installed_rx = installed.watch_installed();
        let initial = recompute(&mut catalog_rx, &mut installed_rx);
        let (updates, _) = watch::channel(initial);
        let updates = Arc::new(updates);

        let stop = shutdown.child_token();
        tokio::spawn(run_join(
            catalog_rx,
            installed_rx,
            Arc::clone(&updates),
            stop.clone(),
        ));

        Self {
            catalog,
            installed,
            updates,
            _task: stop.drop_guard(),
        }
    }

    /// Subscribe to the available updates list.
    pub fn available_updates(&self) -> watch::Receiver<Vec<AvailableUpdate>> {
        self.updates.subscribe()
    }

    /// Current available updates.
    pub fn current(&self) -> Vec<AvailableUpdate> {
        self.updates.borrow().clone()
    }

    /// Refresh both sources and return the recomputed list.
    ///
    /// On failure nothing is published by this call.
    pub async fn check_for_updates(&self) -> Result<Vec<AvailableUpdate>, UpdateError> {
        let catalog = self.catalog.refresh_catalog().await.map_err(|e| {
            warn!(error = %e, "Update check failed to refresh catalog");
            e
        })?;
        let installed = self.installed.refresh_installed().await.map_err(|e| {
            warn!(error = %e, "Update check failed to refresh installed artifacts");
            e
        })?;

        let updates = compute_updates(&catalog, &installed);
        info!(updates = updates.len(), "Update check complete");
        publish(&self.updates, updates.clone());
        Ok(updates)
    }
}

async fn run_join(
    mut catalog_rx: watch::Receiver<CatalogSnapshot>,
    mut installed_rx: watch::Receiver<InstalledSnapshot>,
    updates: Arc<watch::Sender<Vec<AvailableUpdate>>>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => break,

            changed = catalog_rx.changed() => {
                if changed.is_err() {
                    debug!("Catalog feed closed");
                    break;
                }
            }

            changed = installed_rx.changed() => {
                if changed.is_err() {
                    debug!("Installed feed closed");
                    break;
                }
            }
        }

        let list = recompute(&mut catalog_rx, &mut installed_rx);
        debug!(updates = list.len(), "Recomputed available updates");
        publish(&updates, list);
    }

    debug!("Update detector stopped");
}

fn recompute(
    catalog_rx: &mut watch::Receiver<CatalogSnapshot>,
    installed_rx: &mut watch::Receiver<InstalledSnapshot>,
) -> Vec<AvailableUpdate> {
    let catalog = catalog_rx.borrow_and_update();
    let installed = installed_rx.borrow_and_update();
    compute_updates(&catalog, &installed)
}

fn publish(updates: &watch::Sender<Vec<AvailableUpdate>>, list: Vec<AvailableUpdate>) {
    updates.send_if_modified(|current| {
        if *current == list {
            false
        } else {
            *current = list;
            true
        }
    });
}
