//! Installer that places artifacts in a local directory.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{info, warn};

use super::error::{InstallError, InstallResult};
use super::{InstallOutcome, PlatformInstaller, StagedArtifact};
use crate::installed::ManifestInstalledRepository;
use crate::package::{installed_filename, InstalledArtifact};

/// Hook invoked when the install directory is not writable.
pub type PermissionCallback = Arc<dyn Fn(&Path) + Send + Sync>;

/// Desktop installer: copies artifacts into an install directory and records
/// them in the installed manifest.
///
/// "Install permission" means write access to the install directory.
pub struct DirectoryInstaller {
    install_dir: PathBuf,
    installed: Arc<ManifestInstalledRepository>,
    on_permission_required: Option<PermissionCallback>,
}

impl DirectoryInstaller {
    /// Create an installer for `install_dir`.
    pub fn new(install_dir: impl Into<PathBuf>, installed: Arc<ManifestInstalledRepository>) -> Self {
        Self {
            install_dir: install_dir.into(),
            installed,
            on_permission_required: None,
        }
    }

    /// Set the remediation hook (builder pattern).
    pub fn with_permission_callback(mut self, callback: PermissionCallback) -> Self {
        self.on_permission_required = Some(callback);
        self
    }

    /// Install directory.
    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Whether the install directory exists (or can be created) and is writable.
    async fn has_permission(&self) -> io::Result<bool> {
        match tokio::fs::create_dir_all(&self.install_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => return Ok(false),
            Err(e) => return Err(e),
        }
        let metadata = tokio::fs::metadata(&self.install_dir).await?;
        Ok(!metadata.permissions().readonly())
    }
}

impl PlatformInstaller for DirectoryInstaller {
    fn attempt_install<'a>(
        &'a self,
        staged: &'a StagedArtifact,
    ) -> BoxFuture<'a, InstallResult<InstallOutcome>> {
        async move {
            let copy_err = |path: &Path, source: io::Error| InstallError::CopyFailed {
                path: path.to_path_buf(),
                source,
            };

            if !self
                .has_permission()
                .await
                .map_err(|e| copy_err(&self.install_dir, e))?
            {
                return Ok(InstallOutcome::PermissionRequired);
            }

            let dest = self.install_dir.join(installed_filename(
                &staged.package_name,
                &staged.version.version_name,
            ));
            let tmp = dest.with_extension("apk.tmp");

            match tokio::fs::copy(&staged.path, &tmp).await {
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                    return Ok(InstallOutcome::PermissionRequired)
                }
                Err(e) => return Err(copy_err(&tmp, e)),
            }
            if let Err(e) = tokio::fs::rename(&tmp, &dest).await {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(copy_err(&dest, e));
            }

            let record = InstalledArtifact::new(
                &staged.package_name,
                staged.version.version_code,
                &staged.version.version_name,
                &dest,
            );
            let previous = self.installed.record_install(record.clone()).await?;

            // Drop the previous version's file if its name differs.
            if let Some(previous) = previous.filter(|p| p.path != dest) {
                if let Err(e) = tokio::fs::remove_file(&previous.path).await {
                    warn!(path = %previous.path.display(), error = %e, "Failed to remove previous version");
                }
            }

            info!(
                package = %staged.package_name,
                version = %staged.version,
                path = %dest.display(),
                "Artifact installed"
            );
            Ok(InstallOutcome::Installed(record))
        }
        .boxed()
    }

    fn request_permission(&self) {
        warn!(
            dir = %self.install_dir.display(),
            "Install directory is not writable; grant write access and retry"
        );
        if let Some(callback) = &self.on_permission_required {
            callback(&self.install_dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installed::InstalledRepository;
    use crate::package::ArtifactVersion;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn setup(temp: &TempDir) -> (DirectoryInstaller, Arc<ManifestInstalledRepository>, StagedArtifact) {
        let installed = Arc::new(ManifestInstalledRepository::new(
            temp.path().join("installed.json"),
        ));
        let installer = DirectoryInstaller::new(temp.path().join("apps"), installed.clone());

        let staged_path = temp.path().join("com.test.app.download");
        std::fs::write(&staged_path, b"artifact bytes").unwrap();
        let staged = StagedArtifact {
            package_name: "com.test.app".to_string(),
            version: ArtifactVersion::new(2, "1.1"),
            path: staged_path,
        };
        (installer, installed, staged)
    }

    #[tokio::test]
    async fn test_install_copies_and_records() {
        let temp = TempDir::new().unwrap();
        let (installer, installed, staged) = setup(&temp);

        let outcome = installer.attempt_install(&staged).await.unwrap();

        let record = match outcome {
            InstallOutcome::Installed(record) => record,
            other => panic!("expected Installed, got {:?}", other),
        };
        assert_eq!(record.path, temp.path().join("apps").join("com.test.app-1.1.apk"));
        assert_eq!(std::fs::read(&record.path).unwrap(), b"artifact bytes");
        assert!(staged.path.exists(), "installer must not consume the staged file");

        let snapshot = installed.refresh_installed().await.unwrap();
        assert_eq!(snapshot["com.test.app"].version_code, 2);
    }

    #[tokio::test]
    async fn test_upgrade_replaces_previous_file() {
        let temp = TempDir::new().unwrap();
        let (installer, _installed, mut staged) = setup(&temp);
        installer.attempt_install(&staged).await.unwrap();

        staged.version = ArtifactVersion::new(3, "1.2");
        installer.attempt_install(&staged).await.unwrap();

        let apps = temp.path().join("apps");
        assert!(!apps.join("com.test.app-1.1.apk").exists());
        assert!(apps.join("com.test.app-1.2.apk").exists());
    }

    #[tokio::test]
    async fn test_readonly_dir_requires_permission() {
        let temp = TempDir::new().unwrap();
        let (installer, installed, staged) = setup(&temp);

        let apps = temp.path().join("apps");
        std::fs::create_dir_all(&apps).unwrap();
        let mut perms = std::fs::metadata(&apps).unwrap().permissions();
        perms.set_readonly(true);
        std::fs::set_permissions(&apps, perms.clone()).unwrap();

        let outcome = installer.attempt_install(&staged).await.unwrap();

        perms.set_readonly(false);
        std::fs::set_permissions(&apps, perms).unwrap();

        assert_eq!(outcome, InstallOutcome::PermissionRequired);
        assert!(installed.snapshot().is_empty());
    }

    #[test]
    fn test_request_permission_invokes_callback() {
        let temp = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let installed = Arc::new(ManifestInstalledRepository::new(
            temp.path().join("installed.json"),
        ));
        let installer = DirectoryInstaller::new(temp.path(), installed)
            .with_permission_callback(Arc::new(move |_: &Path| {
                counter.fetch_add(1, Ordering::SeqCst);
            }));

        installer.request_permission();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
