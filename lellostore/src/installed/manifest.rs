//! JSON manifest of installed artifacts.

use std::io;
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

use super::error::{InstalledError, InstalledResult};
use super::{InstalledRepository, InstalledSnapshot};
use crate::package::InstalledArtifact;

/// On-disk manifest layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    #[serde(default)]
    artifacts: Vec<InstalledArtifact>,
}

/// Installed repository persisted as a JSON manifest.
///
/// A missing manifest is an empty installed set. Writes go to a sibling
/// temporary file first and are renamed into place.
pub struct ManifestInstalledRepository {
    path: PathBuf,
    feed: watch::Sender<InstalledSnapshot>,
    write_lock: Mutex<()>,
}

impl ManifestInstalledRepository {
    /// Create a repository for the manifest at `path`.
    ///
    /// Nothing is read until [`InstalledRepository::refresh_installed`] runs.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (feed, _) = watch::channel(InstalledSnapshot::new());
        Self {
            path: path.into(),
            feed,
            write_lock: Mutex::new(()),
        }
    }

    /// Manifest location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current installed set.
    pub fn snapshot(&self) -> InstalledSnapshot {
        self.feed.borrow().clone()
    }

    /// Record an installation, replacing any previous version of the package.
    ///
    /// Returns the replaced record, if any.
    pub async fn record_install(
        &self,
        artifact: InstalledArtifact,
    ) -> InstalledResult<Option<InstalledArtifact>> {
        let _guard = self.write_lock.lock().await;

        let mut snapshot = self.load().await?;
        info!(
            package = %artifact.package_name,
            version_code = artifact.version_code,
            "Recording installation"
        );
        let previous = snapshot.insert(artifact.package_name.clone(), artifact);

        self.store(&snapshot).await?;
        self.publish(snapshot);
        Ok(previous)
    }

    /// Forget a package. Returns whether it was installed.
    pub async fn remove(&self, package_name: &str) -> InstalledResult<bool> {
        let _guard = self.write_lock.lock().await;

        let mut snapshot = self.load().await?;
        let removed = snapshot.remove(package_name).is_some();
        if removed {
            self.store(&snapshot).await?;
            self.publish(snapshot);
        }
        Ok(removed)
    }

    async fn load(&self) -> InstalledResult<InstalledSnapshot> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No installed manifest yet");
                return Ok(InstalledSnapshot::new());
            }
            Err(source) => {
                return Err(InstalledError::ReadFailed {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let manifest: Manifest =
            serde_json::from_str(&contents).map_err(|e| InstalledError::ParseFailed {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        Ok(manifest
            .artifacts
            .into_iter()
            .map(|a| (a.package_name.clone(), a))
            .collect())
    }

    async fn store(&self, snapshot: &InstalledSnapshot) -> InstalledResult<()> {
        let write_err = |source: io::Error| InstalledError::WriteFailed {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let manifest = Manifest {
            artifacts: snapshot.values().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| write_err(io::Error::other(e)))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(write_err)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(write_err)?;
        Ok(())
    }

    fn publish(&self, snapshot: InstalledSnapshot) {
        self.feed.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

impl InstalledRepository for ManifestInstalledRepository {
    fn watch_installed(&self) -> watch::Receiver<InstalledSnapshot> {
        self.feed.subscribe()
    }

    fn refresh_installed(&self) -> BoxFuture<'_, InstalledResult<InstalledSnapshot>> {
        async move {
            let snapshot = self.load().await?;
            self.publish(snapshot.clone());
            Ok(snapshot)
        }
        .boxed()
    }
}
