//! Download coordinator.
//!
//! Owns the registry of active pipelines and the shared progress map.
//!
//! # Slot lifecycle
//!
//! ```text
//! start ─► registry.entry(pkg) ─┬─ occupied ─► AlreadyInProgress (nothing touched)
//!                               └─ vacant ───► insert, then publish Pending and spawn
//!
//! pipeline task ends (any path) ─► SlotGuard::drop
//!     ├─ remove registry slot (same attempt only)
//!     ├─ force a terminal state if the pipeline never published one
//!     └─ schedule progress removal after the grace period
//! ```
//!
//! The registry slot is held for as long as the pipeline task lives, so a new
//! start for the same package is accepted as soon as the previous one has
//! returned, even while its terminal progress entry is still visible.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::error::{DownloadError, DownloadResult};
use super::pipeline::{CompletedDownload, DownloadPipeline, PipelineContext, DEFAULT_CHUNK_SIZE};
use super::progress::{ProgressMap, ProgressSnapshot, ProgressWriter};
use super::state::{DownloadProgress, DownloadState};
use crate::catalog::CatalogRepository;
use crate::installer::PlatformInstaller;
use crate::package::PackageName;
use crate::remote::RemoteSource;

/// How long a terminal progress entry stays visible.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(3);

/// Download coordinator settings.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Directory for in-flight and permission-pending artifacts.
    pub staging_dir: PathBuf,

    /// Transfer chunk size in bytes.
    pub chunk_size: usize,

    /// Visibility of terminal progress entries.
    pub grace_period: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            staging_dir: std::env::temp_dir().join("lellostore").join("staging"),
            chunk_size: DEFAULT_CHUNK_SIZE,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

impl DownloadConfig {
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }
}

/// Registry entry for a running pipeline.
#[derive(Debug)]
struct ActiveDownload {
    attempt: u64,
    cancel: CancellationToken,
}

struct Inner {
    context: Arc<PipelineContext>,
    grace_period: Duration,
    registry: DashMap<String, ActiveDownload>,
    progress: ProgressMap,
    attempts: AtomicU64,
}

/// Starts, cancels and tracks downloads.
///
/// Cheap to clone; clones share the same registry and progress map.
#[derive(Clone)]
pub struct DownloadCoordinator {
    inner: Arc<Inner>,
}

impl DownloadCoordinator {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        remote: Arc<dyn RemoteSource>,
        installer: Arc<dyn PlatformInstaller>,
        config: DownloadConfig,
    ) -> Self {
        let context = PipelineContext {
            catalog,
            remote,
            installer,
            staging_dir: config.staging_dir,
            chunk_size: config.chunk_size.max(1),
        };

        Self {
            inner: Arc::new(Inner {
                context: Arc::new(context),
                grace_period: config.grace_period,
                registry: DashMap::new(),
                progress: ProgressMap::new(),
                attempts: AtomicU64::new(0),
            }),
        }
    }

    /// Download and install one package version.
    ///
    /// Fails immediately with [`DownloadError::AlreadyInProgress`] when a
    /// pipeline for the package is registered. The pipeline runs on its own
    /// task; dropping the returned future does not stop it (use
    /// [`cancel`](Self::cancel) for that).
    pub async fn start(
        &self,
        package_name: &str,
        version_code: u64,
    ) -> DownloadResult<CompletedDownload> {
        let package = PackageName::parse(package_name)?.into_string();
        let handle = self.launch(&package, version_code)?;

        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(DownloadError::Cancelled { package }),
        }
    }

    /// Register a pipeline, then spawn it.
    ///
    /// The registry shard lock is released before the spawn: a runtime that
    /// is shutting down drops the task in place, and its `SlotGuard` needs
    /// that same shard.
    fn launch(
        &self,
        package: &str,
        version_code: u64,
    ) -> DownloadResult<JoinHandle<DownloadResult<CompletedDownload>>> {
        let cancel = CancellationToken::new();
        let attempt = match self.inner.registry.entry(package.to_string()) {
            Entry::Occupied(_) => {
                debug!(package, version_code, "Rejecting start, download already in progress");
                return Err(DownloadError::AlreadyInProgress {
                    package: package.to_string(),
                });
            }
            Entry::Vacant(slot) => {
                let attempt = self.inner.attempts.fetch_add(1, Ordering::Relaxed) + 1;
                slot.insert(ActiveDownload {
                    attempt,
                    cancel: cancel.clone(),
                });
                attempt
            }
        };

        self.inner
            .progress
            .publish(DownloadProgress::pending(package, attempt));

        let pipeline = DownloadPipeline::new(
            Arc::clone(&self.inner.context),
            package.to_string(),
            version_code,
            ProgressWriter::new(self.inner.progress.clone(), package, attempt),
            cancel,
        );
        let guard = SlotGuard {
            inner: Arc::clone(&self.inner),
            package: package.to_string(),
            attempt,
        };

        info!(package, version_code, attempt, "Starting download");
        Ok(tokio::spawn(async move {
            let _guard = guard;
            pipeline.run().await
        }))
    }

    /// Cancel the registered pipeline for a package.
    ///
    /// Unknown packages are ignored.
    pub fn cancel(&self, package_name: &str) {
        match self.inner.registry.get(package_name) {
            Some(active) => {
                info!(package = package_name, attempt = active.attempt, "Cancelling download");
                active.cancel.cancel();
            }
            None => debug!(package = package_name, "No active download to cancel"),
        }
    }

    /// Cancel every registered pipeline.
    pub fn cancel_all(&self) {
        for active in self.inner.registry.iter() {
            active.cancel.cancel();
        }
    }

    /// Whether a pipeline is registered for the package.
    pub fn is_active(&self, package_name: &str) -> bool {
        self.inner.registry.contains_key(package_name)
    }

    /// Observable package → progress map.
    ///
    /// Keep `borrow()` guards short and never hold one across an `.await`;
    /// pipelines publish through the same channel.
    pub fn active_downloads(&self) -> watch::Receiver<ProgressSnapshot> {
        self.inner.progress.subscribe()
    }

    /// Current progress of one package, if visible.
    pub fn progress_of(&self, package_name: &str) -> Option<DownloadProgress> {
        self.inner.progress.get(package_name)
    }
}

/// Releases a pipeline's slot on every exit path of its task.
struct SlotGuard {
    inner: Arc<Inner>,
    package: String,
    attempt: u64,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let attempt = self.attempt;
        self.inner
            .registry
            .remove_if(&self.package, |_, active| active.attempt == attempt);

        let fallback = if std::thread::panicking() {
            DownloadState::Failed
        } else {
            DownloadState::Cancelled
        };
        self.inner.progress.update(&self.package, attempt, |p| {
            if !p.is_terminal() {
                p.state = fallback;
            }
        });

        let progress = self.inner.progress.clone();
        let package = std::mem::take(&mut self.package);
        let grace = self.inner.grace_period;

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(grace).await;
                    if progress.remove_attempt(&package, attempt) {
                        debug!(package = %package, attempt, "Removed finished download");
                    }
                });
            }
            Err(_) => {
                progress.remove_attempt(&package, attempt);
            }
        }
    }
}
