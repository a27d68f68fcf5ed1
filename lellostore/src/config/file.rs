//! INI configuration file.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use tracing::debug;

use super::error::ConfigError;
use super::{StoreConfig, DEFAULT_TIMEOUT_SECS};

/// Environment variable that overrides the stored access token.
pub const TOKEN_ENV_VAR: &str = "LELLOSTORE_TOKEN";

/// Location of the configuration file.
///
/// `~/.config/lellostore/config.ini` on Linux.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lellostore")
        .join("config.ini")
}

/// `[server]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerSettings {
    pub url: Option<String>,
    pub token: Option<String>,
}

/// `[downloads]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    pub staging_dir: Option<PathBuf>,
    pub install_dir: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            staging_dir: None,
            install_dir: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Persisted configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub server: ServerSettings,
    pub downloads: DownloadSettings,
}

impl ConfigFile {
    /// Load from [`config_file_path`]. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from an explicit path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(source) => ConfigError::Read {
                path: path.to_path_buf(),
                source,
            },
            ini::Error::Parse(e) => ConfigError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;

        let value = |section: &str, key: &str| -> Option<String> {
            ini.section(Some(section))
                .and_then(|s| s.get(key))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let timeout_secs = match value("downloads", "timeout_secs") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Parse {
                path: path.to_path_buf(),
                reason: format!("downloads.timeout_secs is not a number: {}", raw),
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            server: ServerSettings {
                url: value("server", "url"),
                token: value("server", "token"),
            },
            downloads: DownloadSettings {
                staging_dir: value("downloads", "staging_dir").map(PathBuf::from),
                install_dir: value("downloads", "install_dir").map(PathBuf::from),
                timeout_secs,
            },
        })
    }

    /// Save to [`config_file_path`].
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut ini = Ini::new();
        let mut set = |section: &str, key: &str, value: String| {
            ini.set_to(Some(section), key.to_string(), value);
        };

        if let Some(url) = &self.server.url {
            set("server", "url", url.clone());
        }
        if let Some(token) = &self.server.token {
            set("server", "token", token.clone());
        }
        if let Some(dir) = &self.downloads.staging_dir {
            set("downloads", "staging_dir", dir.display().to_string());
        }
        if let Some(dir) = &self.downloads.install_dir {
            set("downloads", "install_dir", dir.display().to_string());
        }
        set(
            "downloads",
            "timeout_secs",
            self.downloads.timeout_secs.to_string(),
        );

        ini.write_to_file(path).map_err(write_err)
    }

    /// Build the runtime configuration.
    ///
    /// `LELLOSTORE_TOKEN`, when set and non-empty, replaces the stored token.
    pub fn to_store_config(&self) -> StoreConfig {
        let mut config = StoreConfig::default();
        if let Some(url) = &self.server.url {
            config.server_url = url.clone();
        }

        let token = env::var(TOKEN_ENV_VAR)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.server.token.clone());
        config = config.with_access_token(token);

        if let Some(dir) = &self.downloads.install_dir {
            config = config.with_install_dir(dir);
        }
        if let Some(dir) = &self.downloads.staging_dir {
            config = config.with_staging_dir(dir);
        }
        config.with_timeout(Duration::from_secs(self.downloads.timeout_secs.max(1)))
    }
}
