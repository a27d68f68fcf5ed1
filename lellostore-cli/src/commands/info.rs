//! `lellostore info <package>`

use console::style;
use lellostore::catalog::CatalogRepository;
use lellostore::package::PackageName;

use super::{format_size, Store, StoreArgs};
use crate::error::CliError;

pub async fn run(args: &StoreArgs, package: &str) -> Result<(), CliError> {
    let package = PackageName::parse(package).map_err(|e| CliError::Config(e.to_string()))?;
    let store = Store::open(args)?;
    let detail = store.catalog.refresh_artifact(package.as_str()).await?;

    println!("{} ({})", style(&detail.name).bold(), detail.package_name);
    if let Some(description) = &detail.description {
        println!("{}", description);
    }
    println!();

    if detail.versions.is_empty() {
        println!("No published versions.");
        return Ok(());
    }

    let mut versions: Vec<_> = detail.versions.iter().collect();
    versions.sort_by(|a, b| b.version_code.cmp(&a.version_code));

    println!("  {:<8} {:<16} {:<10} {:<8} UPLOADED", "CODE", "VERSION", "SIZE", "MIN SDK");
    for v in versions {
        println!(
            "  {:<8} {:<16} {:<10} {:<8} {}{}",
            v.version_code,
            v.version_name,
            format_size(v.size_bytes),
            v.min_platform_version,
            v.uploaded_at,
            if v.is_verifiable() { "" } else { "  (unverified)" }
        );
    }

    Ok(())
}
