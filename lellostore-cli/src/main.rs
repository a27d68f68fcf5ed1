//! LelloStore CLI - command-line client for a private app catalog.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lellostore::config::log_dir;
use lellostore::logging::init_logging;

use commands::{config::ConfigCommands, StoreArgs};
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "lellostore", version, about = "Browse, install and update apps from a LelloStore server")]
struct Cli {
    /// Verbose logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Store server URL (overrides server.url)
    #[arg(long, global = true, value_name = "URL")]
    server: Option<String>,

    /// Install directory (overrides downloads.install_dir)
    #[arg(long, global = true, value_name = "DIR")]
    install_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the catalog
    List,

    /// Show every published version of a package
    Info {
        /// Package name (e.g., com.example.app)
        package: String,
    },

    /// Download, verify and install a package
    Install {
        /// Package name (e.g., com.example.app)
        package: String,

        /// Version to install (default: latest)
        #[arg(long)]
        version_code: Option<u64>,
    },

    /// Show installed packages with newer versions in the catalog
    Updates,

    /// Install available updates
    Upgrade {
        /// Only upgrade this package
        package: Option<String>,

        /// Upgrade every package with an update
        #[arg(long, conflicts_with = "package")]
        all: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// View or change configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", console::style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let _log_guard = init_logging(&log_dir(), cli.verbose)?;

    if let Commands::Config(command) = cli.command {
        return commands::config::run(command);
    }

    let args = StoreArgs {
        server: cli.server,
        install_dir: cli.install_dir,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::System(format!("Failed to start async runtime: {}", e)))?;

    runtime.block_on(async move {
        match cli.command {
            Commands::List => commands::list::run(&args).await,
            Commands::Info { package } => commands::info::run(&args, &package).await,
            Commands::Install {
                package,
                version_code,
            } => commands::install::run(&args, &package, version_code).await,
            Commands::Updates => commands::updates::run_updates(&args).await,
            Commands::Upgrade { package, all, yes } => {
                commands::updates::run_upgrade(&args, package, all, yes).await
            }
            Commands::Config(_) => Ok(()),
        }
    })
}
