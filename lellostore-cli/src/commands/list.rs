//! `lellostore list`

use console::style;
use lellostore::catalog::CatalogRepository;
use lellostore::installed::InstalledRepository;

use super::{format_size, Store, StoreArgs};
use crate::error::CliError;

pub async fn run(args: &StoreArgs) -> Result<(), CliError> {
    let store = Store::open(args)?;
    let catalog = store.catalog.refresh_catalog().await?;
    let installed = store.installed.refresh_installed().await?;

    if catalog.is_empty() {
        println!("The catalog is empty.");
        return Ok(());
    }

    println!("{} package(s) at {}", catalog.len(), store.config.server_url);
    println!();

    for entry in catalog.values() {
        let latest = match &entry.latest_version {
            Some(v) => format!("{} ({})", v.version_name, format_size(v.size_bytes)),
            None => "no releases".to_string(),
        };

        let marker = match (installed.get(&entry.package_name), entry.latest_version_code()) {
            (Some(local), Some(latest)) if latest > local.version_code => {
                style(format!("update from {}", local.version_name)).yellow().to_string()
            }
            (Some(_), _) => style("installed").green().to_string(),
            (None, _) => String::new(),
        };

        println!(
            "  {:<40} {:<24} {}",
            style(&entry.package_name).bold(),
            latest,
            marker
        );
        println!("      {}", entry.name);
    }

    Ok(())
}
