//! CLI command implementations.
//!
//! Every command except `config` talks to the store through a [`Store`],
//! which wires the library's collaborators from the configuration file and
//! command-line overrides.

pub mod config;
pub mod info;
pub mod install;
pub mod list;
pub mod updates;

mod progress;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use console::style;
use lellostore::catalog::CachedCatalog;
use lellostore::config::{ConfigFile, StoreConfig};
use lellostore::download::DownloadCoordinator;
use lellostore::installed::ManifestInstalledRepository;
use lellostore::installer::DirectoryInstaller;
use lellostore::remote::HttpRemoteSource;
use tracing::debug;

use crate::error::CliError;

/// Global overrides from the command line.
#[derive(Debug, Clone, Default)]
pub struct StoreArgs {
    pub server: Option<String>,
    pub install_dir: Option<PathBuf>,
}

/// Wired store collaborators for one CLI invocation.
pub struct Store {
    pub config: StoreConfig,
    pub catalog: Arc<CachedCatalog>,
    pub installed: Arc<ManifestInstalledRepository>,
    pub coordinator: DownloadCoordinator,
    interrupted: Arc<AtomicBool>,
}

impl Store {
    /// Build from the config file plus overrides.
    pub fn open(args: &StoreArgs) -> Result<Self, CliError> {
        let file = ConfigFile::load()?;
        let mut config = file.to_store_config();
        if let Some(server) = &args.server {
            config.server_url = server.clone();
        }
        if let Some(dir) = &args.install_dir {
            config = config.with_install_dir(dir);
        }
        debug!(server = %config.server_url, install_dir = %config.install_dir.display(), "Opening store");

        let remote = Arc::new(
            HttpRemoteSource::with_timeout(config.server_url.clone(), config.timeout)?
                .with_access_token(config.access_token.clone()),
        );
        let catalog = Arc::new(CachedCatalog::new(remote.clone()));
        let installed = Arc::new(ManifestInstalledRepository::new(&config.manifest_path));
        let installer = DirectoryInstaller::new(&config.install_dir, installed.clone())
            .with_permission_callback(Arc::new(print_permission_help));

        let coordinator = DownloadCoordinator::new(
            catalog.clone(),
            remote,
            Arc::new(installer),
            config.download_config(),
        );

        Ok(Self {
            config,
            catalog,
            installed,
            coordinator,
            interrupted: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Cancel all downloads on Ctrl-C.
    pub fn cancel_on_interrupt(&self) -> Result<(), CliError> {
        let coordinator = self.coordinator.clone();
        let interrupted = Arc::clone(&self.interrupted);
        ctrlc::set_handler(move || {
            eprintln!();
            eprintln!("Interrupted, cancelling downloads...");
            interrupted.store(true, Ordering::SeqCst);
            coordinator.cancel_all();
        })
        .map_err(|e| CliError::System(format!("Failed to set signal handler: {}", e)))
    }

    /// Set once Ctrl-C was pressed.
    pub fn interrupted(&self) -> &AtomicBool {
        &self.interrupted
    }
}

fn print_permission_help(install_dir: &Path) {
    eprintln!(
        "{} cannot write to {}",
        style("Permission required:").yellow().bold(),
        install_dir.display()
    );
    eprintln!("  Grant write access or choose another directory:");
    eprintln!("    lellostore config set downloads.install_dir <DIR>");
    eprintln!("  The downloaded file is kept, so the next attempt skips the download.");
}

/// Human-readable byte size.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
