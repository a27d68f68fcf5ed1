//! Client configuration.
//!
//! [`StoreConfig`] is the runtime configuration consumed by the library.
//! [`ConfigFile`] is its persisted, user-editable subset stored as INI at
//! [`config_file_path`]:
//!
//! ```ini
//! [server]
//! url = http://127.0.0.1:8080
//! token = ...
//!
//! [downloads]
//! staging_dir = /home/user/.local/share/lellostore/staging
//! install_dir = /home/user/.local/share/lellostore/apps
//! timeout_secs = 30
//! ```

mod error;
mod file;
mod keys;

pub use error::ConfigError;
pub use file::{config_file_path, ConfigFile, DownloadSettings, ServerSettings, TOKEN_ENV_VAR};
pub use keys::ConfigKey;

use std::path::PathBuf;
use std::time::Duration;

use crate::download::{DownloadConfig, DEFAULT_CHUNK_SIZE, DEFAULT_GRACE_PERIOD};

/// Default store server.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Per-user data directory (`~/.local/share/lellostore` on Linux).
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("lellostore")
}

/// Directory for rolling log files.
pub fn log_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the store server.
    pub server_url: String,

    /// Bearer token sent with every request.
    pub access_token: Option<String>,

    /// Directory for in-flight downloads.
    pub staging_dir: PathBuf,

    /// Directory installed artifacts are copied into.
    pub install_dir: PathBuf,

    /// Installed-artifacts manifest.
    pub manifest_path: PathBuf,

    /// HTTP metadata request timeout.
    pub timeout: Duration,

    pub chunk_size: usize,

    /// How long finished downloads stay visible.
    pub grace_period: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let data = data_dir();
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            access_token: None,
            staging_dir: data.join("staging"),
            install_dir: data.join("apps"),
            manifest_path: data.join("installed.json"),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            chunk_size: DEFAULT_CHUNK_SIZE,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

impl StoreConfig {
    /// Default configuration against the given server.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Default::default()
        }
    }

    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_staging_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.staging_dir = path.into();
        self
    }

    /// Set the install directory; the manifest moves along with it.
    pub fn with_install_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.install_dir = path.into();
        self.manifest_path = self.install_dir.join("installed.json");
        self
    }

    pub fn with_manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Settings for the download coordinator.
    pub fn download_config(&self) -> DownloadConfig {
        DownloadConfig::new(self.staging_dir.clone())
            .with_chunk_size(self.chunk_size)
            .with_grace_period(self.grace_period)
    }
}
