//! Addressable configuration keys for `config get/set`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::error::ConfigError;
use super::file::ConfigFile;

/// A `section.key` configuration setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ServerUrl,
    ServerToken,
    DownloadsStagingDir,
    DownloadsInstallDir,
    DownloadsTimeoutSecs,
}

impl ConfigKey {
    /// Every key, in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            Self::ServerUrl,
            Self::ServerToken,
            Self::DownloadsStagingDir,
            Self::DownloadsInstallDir,
            Self::DownloadsTimeoutSecs,
        ]
    }

    /// Full name, e.g. `server.url`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ServerUrl => "server.url",
            Self::ServerToken => "server.token",
            Self::DownloadsStagingDir => "downloads.staging_dir",
            Self::DownloadsInstallDir => "downloads.install_dir",
            Self::DownloadsTimeoutSecs => "downloads.timeout_secs",
        }
    }

    pub fn section(&self) -> &'static str {
        match self {
            Self::ServerUrl | Self::ServerToken => "server",
            _ => "downloads",
        }
    }

    pub fn key_name(&self) -> &'static str {
        let name = self.name();
        &name[self.section().len() + 1..]
    }

    /// Whether the value should be masked when displayed.
    pub fn is_secret(&self) -> bool {
        matches!(self, Self::ServerToken)
    }

    /// Current value as a string; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        let path = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        };
        match self {
            Self::ServerUrl => config.server.url.clone().unwrap_or_default(),
            Self::ServerToken => config.server.token.clone().unwrap_or_default(),
            Self::DownloadsStagingDir => path(&config.downloads.staging_dir),
            Self::DownloadsInstallDir => path(&config.downloads.install_dir),
            Self::DownloadsTimeoutSecs => config.downloads.timeout_secs.to_string(),
        }
    }

    /// Set a value. An empty string clears optional settings.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let optional = |v: &str| (!v.is_empty()).then(|| v.to_string());

        match self {
            Self::ServerUrl => {
                if !value.is_empty() && !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(self.invalid("must start with http:// or https://"));
                }
                config.server.url = optional(value);
            }
            Self::ServerToken => config.server.token = optional(value),
            Self::DownloadsStagingDir => {
                config.downloads.staging_dir = optional(value).map(PathBuf::from)
            }
            Self::DownloadsInstallDir => {
                config.downloads.install_dir = optional(value).map(PathBuf::from)
            }
            Self::DownloadsTimeoutSecs => {
                let secs: u64 = value
                    .parse()
                    .map_err(|_| self.invalid("must be a whole number of seconds"))?;
                if secs == 0 {
                    return Err(self.invalid("must be greater than zero"));
                }
                config.downloads.timeout_secs = secs;
            }
        }
        Ok(())
    }

    fn invalid(&self, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
