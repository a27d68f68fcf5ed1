//! CLI error type.

use std::fmt;

use lellostore::catalog::CatalogError;
use lellostore::config::ConfigError;
use lellostore::installed::InstalledError;
use lellostore::logging::LoggingError;
use lellostore::remote::RemoteError;
use lellostore::updates::UpdateError;

/// Errors surfaced to the user as a single line on stderr.
#[derive(Debug)]
pub enum CliError {
    /// Bad or missing configuration.
    Config(String),
    /// Catalog or server access failed.
    Store(String),
    /// A download did not complete.
    Download { package: String, reason: String },
    /// Interactive prompt failed.
    Prompt(String),
    /// The runtime or another system facility failed.
    System(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Store(msg) => write!(f, "Store error: {}", msg),
            CliError::Download { package, reason } => write!(f, "{}: {}", package, reason),
            CliError::Prompt(msg) => write!(f, "Prompt failed: {}", msg),
            CliError::System(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::System(e.to_string())
    }
}

impl From<RemoteError> for CliError {
    fn from(e: RemoteError) -> Self {
        CliError::Store(e.to_string())
    }
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        CliError::Store(e.to_string())
    }
}

impl From<InstalledError> for CliError {
    fn from(e: InstalledError) -> Self {
        CliError::Store(e.to_string())
    }
}

impl From<UpdateError> for CliError {
    fn from(e: UpdateError) -> Self {
        CliError::Store(e.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::System(e.to_string())
    }
}
