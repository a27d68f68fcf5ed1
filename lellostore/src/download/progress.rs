//! Aggregated download progress.
//!
//! [`ProgressMap`] is the single authoritative package → progress mapping.
//! It is published through a `tokio::sync::watch` channel: observers always
//! see a complete snapshot and are woken on every change. Each key has one
//! writer (its pipeline, through a [`ProgressWriter`]), so updates are
//! last-write-wins without any coordination beyond the channel itself.
//!
//! Writers take the channel's write lock for the length of one entry update.
//! Reads through [`ProgressMap::snapshot`] and [`ProgressMap::get`] copy out
//! and release the read lock immediately. Holders of a subscribed
//! `watch::Receiver` must keep `borrow()` guards equally short (clone what
//! they need, then drop the guard); a guard held across an `.await` stalls
//! every pipeline's progress updates.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::watch;

use super::state::{DownloadProgress, DownloadState};

/// Snapshot of all visible downloads, ordered by package name.
pub type ProgressSnapshot = BTreeMap<String, DownloadProgress>;

/// Shared, observable progress map.
#[derive(Debug, Clone)]
pub struct ProgressMap {
    tx: Arc<watch::Sender<ProgressSnapshot>>,
}

impl Default for ProgressMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressMap {
    /// Create an empty map.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ProgressSnapshot::new());
        Self { tx: Arc::new(tx) }
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.tx.subscribe()
    }

    /// Copy of the current snapshot.
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.tx.borrow().clone()
    }

    /// Current entry for one package.
    pub fn get(&self, package_name: &str) -> Option<DownloadProgress> {
        self.tx.borrow().get(package_name).cloned()
    }

    /// Insert or replace a package's entry.
    pub(crate) fn publish(&self, progress: DownloadProgress) {
        self.tx.send_modify(|map| {
            map.insert(progress.package_name.clone(), progress);
        });
    }

    /// Mutate a package's entry if it still belongs to `attempt`.
    ///
    /// Returns whether an entry was updated.
    pub(crate) fn update(
        &self,
        package_name: &str,
        attempt: u64,
        f: impl FnOnce(&mut DownloadProgress),
    ) -> bool {
        self.tx.send_if_modified(|map| match map.get_mut(package_name) {
            Some(entry) if entry.attempt == attempt => {
                f(entry);
                true
            }
            _ => false,
        })
    }

    /// Remove a package's entry if it still belongs to `attempt`.
    ///
    /// A newer attempt for the same package keeps its entry.
    pub(crate) fn remove_attempt(&self, package_name: &str, attempt: u64) -> bool {
        self.tx.send_if_modified(|map| {
            if map.get(package_name).is_some_and(|p| p.attempt == attempt) {
                map.remove(package_name);
                true
            } else {
                false
            }
        })
    }
}

/// Write handle for one pipeline's entry.
#[derive(Debug, Clone)]
pub(crate) struct ProgressWriter {
    map: ProgressMap,
    package_name: String,
    attempt: u64,
}

impl ProgressWriter {
    pub(crate) fn new(map: ProgressMap, package_name: impl Into<String>, attempt: u64) -> Self {
        Self {
            map,
            package_name: package_name.into(),
            attempt,
        }
    }

    pub(crate) fn set_state(&self, state: DownloadState) {
        self.map
            .update(&self.package_name, self.attempt, |p| p.state = state);
    }

    pub(crate) fn record_bytes(&self, bytes_downloaded: u64, total_bytes: u64) {
        self.map.update(&self.package_name, self.attempt, |p| {
            p.record_bytes(bytes_downloaded, total_bytes)
        });
    }
}
