//! Installed-artifacts repository.
//!
//! Publishes the set of artifacts installed on this machine as a watch feed.
//! [`ManifestInstalledRepository`] keeps that set in a JSON manifest.

mod error;
mod manifest;

pub use error::{InstalledError, InstalledResult};
pub use manifest::ManifestInstalledRepository;

use std::collections::BTreeMap;

use futures::future::BoxFuture;
use tokio::sync::watch;

use crate::package::InstalledArtifact;

/// Installed feed contents: package name → installed artifact.
pub type InstalledSnapshot = BTreeMap<String, InstalledArtifact>;

/// Access to the installed-artifacts set.
pub trait InstalledRepository: Send + Sync {
    /// Subscribe to the installed feed.
    fn watch_installed(&self) -> watch::Receiver<InstalledSnapshot>;

    /// Re-read the installed set from its source of truth and publish it.
    fn refresh_installed(&self) -> BoxFuture<'_, InstalledResult<InstalledSnapshot>>;
}
