//! Per-request download pipeline.
//!
//! One [`DownloadPipeline`] runs for each accepted start request:
//!
//! ```text
//! resolve metadata ──► locate version ──► stream to staging ──► verify ──► install
//!        │                   │                   │                 │          │
//!        └───────────────────┴───────────────────┴─────────────────┴──────────┴──► terminal state
//! ```
//!
//! Every await point is raced against the pipeline's cancellation token. The
//! staging file is owned by a [`StagingFile`] guard, so any exit other than
//! a permission-pending install deletes it.

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::checksum::{calculate_file_checksum, digests_match};
use super::error::{DownloadError, DownloadResult};
use super::progress::ProgressWriter;
use super::staging::StagingFile;
use super::state::DownloadState;
use crate::catalog::CatalogRepository;
use crate::installer::{InstallOutcome, PlatformInstaller, StagedArtifact};
use crate::package::{staging_filename, ArtifactVersion, InstalledArtifact};
use crate::remote::RemoteSource;

/// Default transfer chunk size (8 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Collaborators shared by all pipelines of one coordinator.
pub struct PipelineContext {
    pub catalog: Arc<dyn CatalogRepository>,
    pub remote: Arc<dyn RemoteSource>,
    pub installer: Arc<dyn PlatformInstaller>,
    pub staging_dir: PathBuf,
    pub chunk_size: usize,
}

/// A successfully installed download.
#[derive(Debug, Clone)]
pub struct CompletedDownload {
    pub package_name: String,
    pub version: ArtifactVersion,

    /// Bytes transferred over the network (0 when a staged file was reused).
    pub bytes_downloaded: u64,

    /// Whether a previously staged, digest-matching file was reused.
    pub reused_staging: bool,

    pub installed: InstalledArtifact,
}

pub(crate) struct DownloadPipeline {
    context: Arc<PipelineContext>,
    package_name: String,
    version_code: u64,
    progress: ProgressWriter,
    cancel: CancellationToken,
}

impl DownloadPipeline {
    pub(crate) fn new(
        context: Arc<PipelineContext>,
        package_name: String,
        version_code: u64,
        progress: ProgressWriter,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            context,
            package_name,
            version_code,
            progress,
            cancel,
        }
    }

    /// Run to completion and publish the terminal state.
    pub(crate) async fn run(self) -> DownloadResult<CompletedDownload> {
        let result = self.execute().await;

        match &result {
            Ok(done) => {
                self.progress.set_state(DownloadState::Completed);
                info!(
                    package = %self.package_name,
                    version_code = self.version_code,
                    bytes = done.bytes_downloaded,
                    reused = done.reused_staging,
                    "Download installed"
                );
            }
            Err(e) if e.is_cancelled() => {
                self.progress.set_state(DownloadState::Cancelled);
                info!(package = %self.package_name, "Download cancelled");
            }
            Err(e) => {
                self.progress.set_state(DownloadState::Failed);
                warn!(
                    package = %self.package_name,
                    version_code = self.version_code,
                    error = %e,
                    "Download failed"
                );
            }
        }

        result
    }

    async fn execute(&self) -> DownloadResult<CompletedDownload> {
        let package = self.package_name.as_str();

        let detail = self
            .checkpoint(self.context.catalog.refresh_artifact(package))
            .await?
            .map_err(|e| DownloadError::from_catalog(package, e))?;

        let version = detail
            .find_version(self.version_code)
            .cloned()
            .ok_or_else(|| DownloadError::VersionNotFound {
                package: package.to_string(),
                version_code: self.version_code,
            })?;

        let staging_dir = &self.context.staging_dir;
        tokio::fs::create_dir_all(staging_dir)
            .await
            .map_err(|e| DownloadError::staging(staging_dir, e))?;

        let mut staging = StagingFile::new(staging_dir.join(staging_filename(package)));

        let reused = self.reusable_staging(&staging, &version).await?;
        let bytes_downloaded = if reused {
            info!(package, path = %staging.path().display(), "Reusing verified staged file");
            self.progress.set_state(DownloadState::Downloading);
            self.progress.record_bytes(version.size_bytes, version.size_bytes);
            0
        } else {
            self.download(&staging, &version).await?
        };

        self.progress.set_state(DownloadState::Verifying);
        if !reused {
            self.verify(&mut staging, &version).await?;
        }

        // Installation is not interruptible once handed off.
        if self.cancel.is_cancelled() {
            return Err(self.cancelled());
        }

        self.progress.set_state(DownloadState::Installing);
        let staged = StagedArtifact {
            package_name: package.to_string(),
            version: version.clone(),
            path: staging.path().to_path_buf(),
        };

        match self.context.installer.attempt_install(&staged).await {
            Ok(InstallOutcome::Installed(installed)) => Ok(CompletedDownload {
                package_name: package.to_string(),
                version,
                bytes_downloaded,
                reused_staging: reused,
                installed,
            }),
            Ok(InstallOutcome::PermissionRequired) => {
                self.context.installer.request_permission();
                staging.retain();
                Err(DownloadError::InstallPermissionRequired {
                    package: package.to_string(),
                    staged: staged.path,
                })
            }
            Err(source) => Err(DownloadError::InstallFailed {
                package: package.to_string(),
                source,
            }),
        }
    }

    /// Stream the artifact into the staging file.
    async fn download(&self, staging: &StagingFile, version: &ArtifactVersion) -> DownloadResult<u64> {
        let package = self.package_name.as_str();
        self.progress.set_state(DownloadState::Downloading);

        let stream = self
            .checkpoint(self.context.remote.open_artifact(package, version.version_code))
            .await?
            .map_err(|e| DownloadError::transport(package, e))?;

        let total = if version.size_bytes > 0 {
            version.size_bytes
        } else {
            stream.content_length.unwrap_or(0)
        };
        self.progress.record_bytes(0, total);

        let path = staging.path();
        let file = File::create(path)
            .await
            .map_err(|e| DownloadError::staging(path, e))?;
        let mut writer = BufWriter::new(file);
        let mut reader = stream.reader;
        let mut buffer = vec![0u8; self.context.chunk_size.max(1)];
        let mut downloaded: u64 = 0;

        loop {
            let read = self
                .checkpoint(reader.read(&mut buffer))
                .await?
                .map_err(|e| DownloadError::transport(package, e))?;
            if read == 0 {
                break;
            }

            writer
                .write_all(&buffer[..read])
                .await
                .map_err(|e| DownloadError::staging(path, e))?;
            downloaded += read as u64;
            self.progress.record_bytes(downloaded, total);
        }

        writer
            .flush()
            .await
            .map_err(|e| DownloadError::staging(path, e))?;

        debug!(package, bytes = downloaded, total, "Transfer finished");
        Ok(downloaded)
    }

    /// Compare the staged file against the published digest.
    async fn verify(&self, staging: &mut StagingFile, version: &ArtifactVersion) -> DownloadResult<()> {
        let package = self.package_name.as_str();

        let Some(expected) = version.sha256.as_deref() else {
            warn!(package, version_code = version.version_code, "No digest published, skipping verification");
            return Ok(());
        };

        let actual = self.hash(staging).await?;
        if digests_match(expected, &actual) {
            debug!(package, "Checksum verified");
            return Ok(());
        }

        if let Err(e) = staging.discard() {
            warn!(package, error = %e, "Failed to delete mismatched staged file");
        }
        Err(DownloadError::IntegrityMismatch {
            package: package.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }

    /// Whether an existing staged file already matches the published digest.
    async fn reusable_staging(&self, staging: &StagingFile, version: &ArtifactVersion) -> DownloadResult<bool> {
        let Some(expected) = version.sha256.as_deref() else {
            return Ok(false);
        };
        if !tokio::fs::try_exists(staging.path()).await.unwrap_or(false) {
            return Ok(false);
        }

        match self.hash(staging).await {
            Ok(actual) => Ok(digests_match(expected, &actual)),
            Err(DownloadError::Staging { source, .. }) => {
                debug!(package = %self.package_name, error = %source, "Staged file unreadable, downloading again");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn hash(&self, staging: &StagingFile) -> DownloadResult<String> {
        let path = staging.path().to_path_buf();
        let task_path = path.clone();
        self.checkpoint(tokio::task::spawn_blocking(move || {
            calculate_file_checksum(&task_path)
        }))
        .await?
        .map_err(|e| DownloadError::staging(&path, io::Error::other(e)))?
        .map_err(|e| DownloadError::staging(&path, e))
    }

    /// Race a step against cancellation.
    async fn checkpoint<F: Future>(&self, step: F) -> DownloadResult<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(self.cancelled()),
            output = step => Ok(output),
        }
    }

    fn cancelled(&self) -> DownloadError {
        DownloadError::Cancelled {
            package: self.package_name.clone(),
        }
    }
}
