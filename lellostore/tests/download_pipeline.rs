//! End-to-end behaviour of the download coordinator against in-memory
//! collaborators.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use tokio::io::{AsyncWriteExt, DuplexStream};
use tokio::sync::watch;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

use lellostore::catalog::CachedCatalog;
use lellostore::download::{
    DownloadConfig, DownloadCoordinator, DownloadError, DownloadProgress, DownloadState,
    ProgressSnapshot, StartResult,
};
use lellostore::installed::{InstalledRepository, ManifestInstalledRepository};
use lellostore::installer::{
    DirectoryInstaller, InstallOutcome, InstallResult, PlatformInstaller, StagedArtifact,
};
use lellostore::package::{ArtifactDetail, ArtifactVersion, CatalogEntry, InstalledArtifact};
use lellostore::remote::{ArtifactStream, RemoteError, RemoteResult, RemoteSource};
use lellostore::updates::UpdateDetector;

const APP: &str = "com.test.app";

// ============================================================================
// Mocks
// ============================================================================

enum Payload {
    /// Served in 1000-byte pieces.
    Ready(Vec<u8>),
    /// Served piecewise, then the connection drops.
    Broken(Vec<u8>),
    /// Bytes arrive as the test writes them to the other end.
    Gated(Option<DuplexStream>),
}

#[derive(Default)]
struct MockRemote {
    details: Mutex<BTreeMap<String, ArtifactDetail>>,
    payloads: Mutex<HashMap<(String, u64), Payload>>,
    opens: AtomicUsize,
}

impl MockRemote {
    fn publish(&self, detail: ArtifactDetail) {
        self.details
            .lock()
            .insert(detail.package_name.clone(), detail);
    }

    fn serve(&self, package: &str, code: u64, payload: Payload) {
        self.payloads
            .lock()
            .insert((package.to_string(), code), payload);
    }

    /// Serve through a duplex pipe; returns the writing end.
    fn gate(&self, package: &str, code: u64) -> DuplexStream {
        let (writer, reader) = tokio::io::duplex(64 * 1024);
        self.serve(package, code, Payload::Gated(Some(reader)));
        writer
    }

    fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

fn chunked(data: &[u8], fail_at_end: bool) -> ArtifactStream {
    let mut pieces: Vec<io::Result<Bytes>> = data
        .chunks(1000)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    if fail_at_end {
        pieces.push(Err(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "connection reset",
        )));
    }
    ArtifactStream::new(
        StreamReader::new(futures::stream::iter(pieces)),
        Some(data.len() as u64),
    )
}

impl RemoteSource for MockRemote {
    fn fetch_catalog(&self) -> BoxFuture<'_, RemoteResult<Vec<CatalogEntry>>> {
        async move {
            Ok(self
                .details
                .lock()
                .values()
                .map(ArtifactDetail::to_catalog_entry)
                .collect())
        }
        .boxed()
    }

    fn fetch_artifact<'a>(
        &'a self,
        package_name: &'a str,
    ) -> BoxFuture<'a, RemoteResult<ArtifactDetail>> {
        async move {
            self.details
                .lock()
                .get(package_name)
                .cloned()
                .ok_or_else(|| RemoteError::NotFound {
                    url: format!("mock:///api/apps/{}", package_name),
                })
        }
        .boxed()
    }

    fn open_artifact<'a>(
        &'a self,
        package_name: &'a str,
        version_code: u64,
    ) -> BoxFuture<'a, RemoteResult<ArtifactStream>> {
        async move {
            self.opens.fetch_add(1, Ordering::SeqCst);
            let url = format!(
                "mock:///api/apps/{}/versions/{}/apk",
                package_name, version_code
            );

            let mut payloads = self.payloads.lock();
            match payloads.get_mut(&(package_name.to_string(), version_code)) {
                Some(Payload::Ready(data)) => Ok(chunked(data, false)),
                Some(Payload::Broken(data)) => Ok(chunked(data, true)),
                Some(Payload::Gated(reader)) => reader
                    .take()
                    .map(|r| ArtifactStream::new(r, None))
                    .ok_or(RemoteError::Status { url, status: 410 }),
                None => Err(RemoteError::NotFound { url }),
            }
        }
        .boxed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InstallMode {
    Install,
    NeedPermission,
}

struct MockInstaller {
    mode: Mutex<InstallMode>,
    installs: Mutex<Vec<(StagedArtifact, Vec<u8>)>>,
    permission_requests: AtomicUsize,
}

impl MockInstaller {
    fn new(mode: InstallMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            installs: Mutex::new(Vec::new()),
            permission_requests: AtomicUsize::new(0),
        }
    }

    fn set_mode(&self, mode: InstallMode) {
        *self.mode.lock() = mode;
    }
}

impl PlatformInstaller for MockInstaller {
    fn attempt_install<'a>(
        &'a self,
        staged: &'a StagedArtifact,
    ) -> BoxFuture<'a, InstallResult<InstallOutcome>> {
        async move {
            let mode = *self.mode.lock();
            if mode == InstallMode::NeedPermission {
                return Ok(InstallOutcome::PermissionRequired);
            }

            let contents = std::fs::read(&staged.path).expect("staged file readable");
            self.installs.lock().push((staged.clone(), contents));
            Ok(InstallOutcome::Installed(InstalledArtifact::new(
                &staged.package_name,
                staged.version.version_code,
                &staged.version.version_name,
                format!("/apps/{}.apk", staged.package_name),
            )))
        }
        .boxed()
    }

    fn request_permission(&self) {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Fixtures
// ============================================================================

struct Harness {
    _temp: TempDir,
    staging_dir: PathBuf,
    remote: Arc<MockRemote>,
    installer: Arc<MockInstaller>,
    coordinator: DownloadCoordinator,
}

impl Harness {
    fn new() -> Self {
        Self::with_grace(Duration::from_secs(3))
    }

    fn with_grace(grace: Duration) -> Self {
        let temp = TempDir::new().unwrap();
        let staging_dir = temp.path().join("staging");
        let remote = Arc::new(MockRemote::default());
        let installer = Arc::new(MockInstaller::new(InstallMode::Install));
        let catalog = Arc::new(CachedCatalog::new(remote.clone()));

        let coordinator = DownloadCoordinator::new(
            catalog,
            remote.clone(),
            installer.clone(),
            DownloadConfig::new(&staging_dir).with_grace_period(grace),
        );

        Self {
            _temp: temp,
            staging_dir,
            remote,
            installer,
            coordinator,
        }
    }

    fn staged_path(&self, package: &str) -> PathBuf {
        self.staging_dir.join(format!("{}.download", package))
    }
}

fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn detail_with(code: u64, data: &[u8], digest: Option<String>) -> ArtifactDetail {
    let mut version = ArtifactVersion::new(code, format!("{}.0", code)).with_size(data.len() as u64);
    if let Some(digest) = digest {
        version = version.with_sha256(digest);
    }
    ArtifactDetail::new(APP, "Test App").with_version(version)
}

async fn wait_until(
    rx: &mut watch::Receiver<ProgressSnapshot>,
    package: &str,
    predicate: impl Fn(&DownloadProgress) -> bool,
) -> DownloadProgress {
    let snapshot = tokio::time::timeout(
        Duration::from_secs(10),
        rx.wait_for(|map| map.get(package).is_some_and(&predicate)),
    )
    .await
    .expect("timed out waiting for progress")
    .expect("progress map closed")
    .clone();
    snapshot[package].clone()
}

fn exists(path: &Path) -> bool {
    path.try_exists().unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_download_verifies_and_installs() {
    let h = Harness::new();
    let data = payload(20_000);
    h.remote
        .publish(detail_with(1, &data, Some(sha256_hex(&data))));
    h.remote.serve(APP, 1, Payload::Ready(data.clone()));

    let done = h.coordinator.start(APP, 1).await.unwrap();

    assert_eq!(done.bytes_downloaded, 20_000);
    assert!(!done.reused_staging);
    assert_eq!(done.installed.version_code, 1);

    let installs = h.installer.installs.lock();
    assert_eq!(installs.len(), 1);
    assert_eq!(installs[0].1, data);
    drop(installs);

    let progress = h.coordinator.progress_of(APP).unwrap();
    assert_eq!(progress.state, DownloadState::Completed);
    assert_eq!(progress.bytes_downloaded, 20_000);
    assert_eq!(progress.progress, 1.0);
    assert!(!exists(&h.staged_path(APP)));
    assert!(!h.coordinator.is_active(APP));
}

#[tokio::test]
async fn test_duplicate_start_is_rejected_without_touching_progress() {
    let h = Harness::new();
    let data = payload(30_000);
    h.remote
        .publish(detail_with(1, &data, Some(sha256_hex(&data))));
    let mut writer = h.remote.gate(APP, 1);
    let mut rx = h.coordinator.active_downloads();

    let first = {
        let coordinator = h.coordinator.clone();
        tokio::spawn(async move { coordinator.start(APP, 1).await })
    };

    writer.write_all(&data[..10_000]).await.unwrap();
    let before = wait_until(&mut rx, APP, |p| p.bytes_downloaded == 10_000).await;
    assert_eq!(before.state, DownloadState::Downloading);

    let second = h.coordinator.start(APP, 1).await;
    assert!(matches!(second, Err(DownloadError::AlreadyInProgress { .. })));
    assert_eq!(
        StartResult::from(second),
        StartResult::Failed("Download already in progress".to_string())
    );
    assert_eq!(h.coordinator.progress_of(APP).unwrap(), before);
    assert_eq!(h.remote.opens(), 1);

    writer.write_all(&data[10_000..]).await.unwrap();
    drop(writer);

    let result = first.await.unwrap();
    assert_eq!(StartResult::from(result), StartResult::Success);
}

#[tokio::test]
async fn test_concurrent_starts_admit_exactly_one() {
    let h = Harness::new();
    let data = payload(5_000);
    h.remote
        .publish(detail_with(1, &data, Some(sha256_hex(&data))));
    let writer = h.remote.gate(APP, 1);

    let starts: Vec<_> = (0..8)
        .map(|_| {
            let coordinator = h.coordinator.clone();
            tokio::spawn(async move { coordinator.start(APP, 1).await })
        })
        .collect();

    let mut rx = h.coordinator.active_downloads();
    wait_until(&mut rx, APP, |p| p.state == DownloadState::Downloading).await;

    let mut writer = writer;
    writer.write_all(&data).await.unwrap();
    drop(writer);

    let mut accepted = 0;
    let mut rejected = 0;
    for start in starts {
        match start.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(DownloadError::AlreadyInProgress { .. }) => rejected += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(accepted, 1);
    assert_eq!(rejected, 7);
    assert_eq!(h.remote.opens(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_terminal_entry_visible_until_grace_period_ends() {
    let h = Harness::new();
    let data = payload(2_000);
    h.remote
        .publish(detail_with(1, &data, Some(sha256_hex(&data))));
    h.remote.serve(APP, 1, Payload::Ready(data));

    h.coordinator.start(APP, 1).await.unwrap();
    assert!(!h.coordinator.is_active(APP));

    tokio::time::sleep(Duration::from_millis(2_900)).await;
    assert_eq!(
        h.coordinator.progress_of(APP).map(|p| p.state),
        Some(DownloadState::Completed)
    );

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(h.coordinator.progress_of(APP).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_restart_during_grace_keeps_new_entry() {
    let h = Harness::new();
    let data = payload(2_000);
    h.remote
        .publish(detail_with(1, &data, Some(sha256_hex(&data))));
    h.remote.serve(APP, 1, Payload::Ready(data.clone()));

    h.coordinator.start(APP, 1).await.unwrap();
    let first_attempt = h.coordinator.progress_of(APP).unwrap().attempt;

    tokio::time::sleep(Duration::from_secs(1)).await;
    h.coordinator.start(APP, 1).await.unwrap();
    let second_attempt = h.coordinator.progress_of(APP).unwrap().attempt;
    assert_ne!(first_attempt, second_attempt);

    // The first attempt's removal fires here and must not touch the second.
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(
        h.coordinator.progress_of(APP).map(|p| p.attempt),
        Some(second_attempt)
    );

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(h.coordinator.progress_of(APP).is_none());
}

#[tokio::test]
async fn test_cancel_unknown_package_is_silent() {
    let h = Harness::new();
    let data = payload(4_000);
    h.remote
        .publish(detail_with(1, &data, Some(sha256_hex(&data))));
    let mut writer = h.remote.gate(APP, 1);
    let mut rx = h.coordinator.active_downloads();

    let running = {
        let coordinator = h.coordinator.clone();
        tokio::spawn(async move { coordinator.start(APP, 1).await })
    };
    wait_until(&mut rx, APP, |p| p.state == DownloadState::Downloading).await;

    h.coordinator.cancel("com.test.unknown");
    assert!(h.coordinator.is_active(APP));
    assert!(h.coordinator.progress_of("com.test.unknown").is_none());

    writer.write_all(&data).await.unwrap();
    drop(writer);
    assert!(running.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_unknown_version_never_fetches_binary() {
    let h = Harness::new();
    let data = payload(1_000);
    h.remote
        .publish(detail_with(1, &data, Some(sha256_hex(&data))));
    h.remote.serve(APP, 1, Payload::Ready(data));

    let err = h.coordinator.start(APP, 99).await.unwrap_err();

    assert!(matches!(
        err,
        DownloadError::VersionNotFound { version_code: 99, .. }
    ));
    assert_eq!(h.remote.opens(), 0);
    assert_eq!(
        h.coordinator.progress_of(APP).unwrap().state,
        DownloadState::Failed
    );
}

#[tokio::test]
async fn test_unknown_package_fails() {
    let h = Harness::new();

    let result = h.coordinator.start("com.test.absent", 1).await;

    assert!(matches!(result, Err(DownloadError::PackageNotFound { .. })));
    assert_eq!(
        StartResult::from(result),
        StartResult::Failed("Package not found".to_string())
    );
    assert_eq!(h.remote.opens(), 0);
}

#[tokio::test]
async fn test_digest_comparison_ignores_case() {
    let h = Harness::new();
    let data = payload(9_000);
    h.remote.publish(detail_with(
        1,
        &data,
        Some(sha256_hex(&data).to_uppercase()),
    ));
    h.remote.serve(APP, 1, Payload::Ready(data));

    assert!(h.coordinator.start(APP, 1).await.is_ok());
}

#[tokio::test]
async fn test_digest_mismatch_deletes_staged_file() {
    for digest in [sha256_hex(b"something else"), sha256_hex(b"something else").to_uppercase()] {
        let h = Harness::new();
        let data = payload(9_000);
        h.remote.publish(detail_with(1, &data, Some(digest)));
        h.remote.serve(APP, 1, Payload::Ready(data));

        let err = h.coordinator.start(APP, 1).await.unwrap_err();

        assert!(matches!(err, DownloadError::IntegrityMismatch { .. }));
        assert!(!exists(&h.staged_path(APP)));
        assert!(h.installer.installs.lock().is_empty());
        assert_eq!(
            h.coordinator.progress_of(APP).unwrap().state,
            DownloadState::Failed
        );
    }
}

#[tokio::test]
async fn test_transport_failure_deletes_partial_file() {
    let h = Harness::new();
    let data = payload(6_000);
    h.remote
        .publish(detail_with(1, &data, Some(sha256_hex(&data))));
    h.remote.serve(APP, 1, Payload::Broken(data));

    let err = h.coordinator.start(APP, 1).await.unwrap_err();

    assert!(matches!(err, DownloadError::Transport { .. }));
    assert_eq!(err.short_reason(), "Network error");
    assert!(!exists(&h.staged_path(APP)));
    assert!(!h.coordinator.is_active(APP));
}

#[tokio::test]
async fn test_unverified_artifact_installs_without_digest() {
    let h = Harness::new();
    let data = payload(3_000);
    h.remote.publish(detail_with(1, &data, None));
    h.remote.serve(APP, 1, Payload::Ready(data));

    assert!(h.coordinator.start(APP, 1).await.is_ok());
}

#[tokio::test]
async fn test_permission_required_keeps_staged_file_for_retry() {
    let h = Harness::new();
    let data = payload(12_000);
    h.remote
        .publish(detail_with(1, &data, Some(sha256_hex(&data))));
    h.remote.serve(APP, 1, Payload::Ready(data.clone()));
    h.installer.set_mode(InstallMode::NeedPermission);

    let err = h.coordinator.start(APP, 1).await.unwrap_err();

    assert!(matches!(err, DownloadError::InstallPermissionRequired { .. }));
    assert_eq!(h.installer.permission_requests.load(Ordering::SeqCst), 1);
    assert_eq!(std::fs::read(h.staged_path(APP)).unwrap(), data);
    assert_eq!(
        h.coordinator.progress_of(APP).unwrap().state,
        DownloadState::Failed
    );

    h.installer.set_mode(InstallMode::Install);
    let done = h.coordinator.start(APP, 1).await.unwrap();

    assert!(done.reused_staging);
    assert_eq!(done.bytes_downloaded, 0);
    assert_eq!(h.remote.opens(), 1);
    assert_eq!(h.installer.installs.lock()[0].1, data);
    assert!(!exists(&h.staged_path(APP)));
}

#[tokio::test]
async fn test_cancel_mid_stream() {
    let h = Harness::new();
    let data = payload(50_000);
    h.remote
        .publish(detail_with(1, &data, Some(sha256_hex(&data))));
    let mut writer = h.remote.gate(APP, 1);
    let mut rx = h.coordinator.active_downloads();

    let running = {
        let coordinator = h.coordinator.clone();
        tokio::spawn(async move { coordinator.start(APP, 1).await })
    };

    writer.write_all(&data[..8_192]).await.unwrap();
    let partial = wait_until(&mut rx, APP, |p| p.bytes_downloaded > 0).await;
    assert!(partial.progress > 0.0 && partial.progress < 1.0);

    h.coordinator.cancel(APP);
    let result = running.await.unwrap();

    assert!(matches!(result, Err(DownloadError::Cancelled { .. })));
    assert_eq!(StartResult::from(result), StartResult::Cancelled);
    assert!(!exists(&h.staged_path(APP)));
    assert_eq!(
        h.coordinator.progress_of(APP).unwrap().state,
        DownloadState::Cancelled
    );
    assert!(h.installer.installs.lock().is_empty());

    // The slot is free again right away.
    h.remote.serve(APP, 1, Payload::Ready(data));
    assert!(h.coordinator.start(APP, 1).await.is_ok());
}

#[tokio::test]
async fn test_unknown_total_keeps_progress_at_zero() {
    let h = Harness::new();
    let data = payload(4_000);
    h.remote.publish(
        ArtifactDetail::new(APP, "Test App")
            .with_version(ArtifactVersion::new(1, "1.0").with_sha256(sha256_hex(&data))),
    );
    let mut writer = h.remote.gate(APP, 1);
    let mut rx = h.coordinator.active_downloads();

    let running = {
        let coordinator = h.coordinator.clone();
        tokio::spawn(async move { coordinator.start(APP, 1).await })
    };

    writer.write_all(&data[..1_000]).await.unwrap();
    let partial = wait_until(&mut rx, APP, |p| p.bytes_downloaded > 0).await;
    assert_eq!(partial.total_bytes, 0);
    assert_eq!(partial.progress, 0.0);

    writer.write_all(&data[1_000..]).await.unwrap();
    drop(writer);
    assert!(running.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_install_then_detect_and_apply_update() {
    let temp = TempDir::new().unwrap();
    let remote = Arc::new(MockRemote::default());
    let catalog = Arc::new(CachedCatalog::new(remote.clone()));
    let installed = Arc::new(ManifestInstalledRepository::new(
        temp.path().join("installed.json"),
    ));
    let installer = Arc::new(DirectoryInstaller::new(
        temp.path().join("apps"),
        installed.clone(),
    ));
    let coordinator = DownloadCoordinator::new(
        catalog.clone(),
        remote.clone(),
        installer,
        DownloadConfig::new(temp.path().join("staging")),
    );

    let v1 = payload(3_000);
    remote.publish(detail_with(1, &v1, Some(sha256_hex(&v1))));
    remote.serve(APP, 1, Payload::Ready(v1));
    coordinator.start(APP, 1).await.unwrap();

    let v2 = payload(4_000);
    remote.publish(
        detail_with(1, &payload(3_000), None).with_version(
            ArtifactVersion::new(2, "2.0")
                .with_size(v2.len() as u64)
                .with_sha256(sha256_hex(&v2)),
        ),
    );
    remote.serve(APP, 2, Payload::Ready(v2.clone()));

    let detector = UpdateDetector::start(catalog, installed.clone(), CancellationToken::new());
    let updates = detector.check_for_updates().await.unwrap();

    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].package_name(), APP);
    assert_eq!(updates[0].installed_version_code, 1);
    assert_eq!(updates[0].installed_version_name, "1.0");
    assert_eq!(updates[0].available_version_code(), 2);

    let done = coordinator
        .start(updates[0].package_name(), updates[0].available_version_code())
        .await
        .unwrap();
    assert_eq!(std::fs::read(done.installed.path()).unwrap(), v2);

    let mut rx = detector.available_updates();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|list| list.is_empty()))
        .await
        .expect("update list did not clear")
        .unwrap();

    let snapshot = installed.refresh_installed().await.unwrap();
    assert_eq!(snapshot[APP].version_code, 2);
}
