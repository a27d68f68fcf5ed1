//! Configuration management CLI commands.
//!
//! Provides `config get`, `config set`, `config list`, and `config path`
//! for viewing and modifying settings from the command line.

use std::path::Path;

use clap::Subcommand;
use lellostore::config::{config_file_path, ConfigFile, ConfigKey, TOKEN_ENV_VAR};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., server.url)
        key: String,
    },

    /// Set a configuration value (an empty value clears it)
    Set {
        /// Configuration key in format section.key (e.g., server.url)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand against the user's config file.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    let path = config_file_path();
    match command {
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Get { key } => {
            println!("{}", get_value(&path, &key)?);
            Ok(())
        }
        ConfigCommands::Set { key, value } => {
            let key = set_value(&path, &key, &value)?;
            println!("Set {} = {}", key, display_value(key, value.trim()));
            Ok(())
        }
        ConfigCommands::List => run_list(&path),
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'lellostore config list' to see available keys.",
            key
        ))
    })
}

fn display_value(key: ConfigKey, value: &str) -> String {
    if value.is_empty() {
        "(not set)".to_string()
    } else if key.is_secret() {
        "********".to_string()
    } else {
        value.to_string()
    }
}

fn get_value(path: &Path, key: &str) -> Result<String, CliError> {
    let key = parse_key(key)?;
    let config = ConfigFile::load_from(path)?;
    Ok(display_value(key, &key.get(&config)))
}

fn set_value(path: &Path, key: &str, value: &str) -> Result<ConfigKey, CliError> {
    let key = parse_key(key)?;
    let mut config = ConfigFile::load_from(path)?;
    key.set(&mut config, value)?;
    config.save_to(path)?;
    Ok(key)
}

fn run_list(path: &Path) -> Result<(), CliError> {
    let config = ConfigFile::load_from(path)?;

    println!("Configuration Settings");
    println!("======================");
    println!();

    let mut current_section = "";
    for key in ConfigKey::all() {
        let section = key.section();
        if section != current_section {
            if !current_section.is_empty() {
                println!();
            }
            println!("[{}]", section);
            current_section = section;
        }
        println!("  {} = {}", key.key_name(), display_value(*key, &key.get(&config)));
    }

    if std::env::var(TOKEN_ENV_VAR).is_ok_and(|t| !t.trim().is_empty()) {
        println!();
        println!("Note: {} is set and overrides server.token.", TOKEN_ENV_VAR);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_then_get() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");

        set_value(&path, "server.url", "https://store.example.com").unwrap();

        assert_eq!(get_value(&path, "server.url").unwrap(), "https://store.example.com");
        assert_eq!(get_value(&path, "downloads.install_dir").unwrap(), "(not set)");
    }

    #[test]
    fn test_token_is_masked() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");

        set_value(&path, "server.token", "secret").unwrap();

        assert_eq!(get_value(&path, "server.token").unwrap(), "********");
        let stored = ConfigFile::load_from(&path).unwrap();
        assert_eq!(stored.server.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_unknown_key() {
        let temp = TempDir::new().unwrap();
        let err = get_value(&temp.path().join("config.ini"), "server.port").unwrap_err();
        assert!(err.to_string().contains("lellostore config list"));
    }

    #[test]
    fn test_invalid_value_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        assert!(set_value(&path, "downloads.timeout_secs", "soon").is_err());
        assert!(!path.exists());
    }
}
