//! `lellostore install <package>`

use console::style;
use lellostore::catalog::CatalogRepository;
use lellostore::package::PackageName;

use super::progress::download_with_progress;
use super::{Store, StoreArgs};
use crate::error::CliError;

pub async fn run(
    args: &StoreArgs,
    package: &str,
    version_code: Option<u64>,
) -> Result<(), CliError> {
    let package = PackageName::parse(package).map_err(|e| CliError::Config(e.to_string()))?;
    let package = package.as_str();

    let store = Store::open(args)?;
    store.cancel_on_interrupt()?;

    let version_code = match version_code {
        Some(code) => code,
        None => {
            let detail = store.catalog.refresh_artifact(package).await?;
            detail
                .latest_version()
                .map(|v| v.version_code)
                .ok_or_else(|| {
                    CliError::Store(format!("{} has no published versions", package))
                })?
        }
    };

    let done = download_with_progress(&store, package, version_code).await?;

    println!(
        "{} {} {} installed to {}",
        style("✓").green().bold(),
        done.package_name,
        done.version,
        done.installed.path().display()
    );
    if done.reused_staging {
        println!("  Reused the previously downloaded file.");
    }
    Ok(())
}
