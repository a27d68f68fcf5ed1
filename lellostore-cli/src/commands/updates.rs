//! `lellostore updates` and `lellostore upgrade`

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use console::style;
use dialoguer::Confirm;
use lellostore::updates::{AvailableUpdate, UpdateDetector};
use tokio_util::sync::CancellationToken;

use super::progress::download_with_progress;
use super::{Store, StoreArgs};
use crate::error::CliError;

async fn detect(store: &Store) -> Result<Vec<AvailableUpdate>, CliError> {
    let detector = UpdateDetector::start(
        store.catalog.clone(),
        store.installed.clone(),
        CancellationToken::new(),
    );
    Ok(detector.check_for_updates().await?)
}

fn print_updates(updates: &[AvailableUpdate]) {
    for update in updates {
        println!(
            "  {:<40} {} -> {}",
            style(update.package_name()).bold(),
            update.installed_version_name,
            style(update.available_version_name()).green()
        );
    }
}

pub async fn run_updates(args: &StoreArgs) -> Result<(), CliError> {
    let store = Store::open(args)?;
    let updates = detect(&store).await?;

    if updates.is_empty() {
        println!("Everything is up to date.");
        return Ok(());
    }

    println!("{} update(s) available:", updates.len());
    print_updates(&updates);
    Ok(())
}

pub async fn run_upgrade(
    args: &StoreArgs,
    package: Option<String>,
    all: bool,
    yes: bool,
) -> Result<(), CliError> {
    let store = Store::open(args)?;
    let updates = select_updates(detect(&store).await?, package.as_deref(), all)?;

    if updates.is_empty() {
        match package {
            Some(package) => println!("{} is up to date or not installed.", package),
            None => println!("Everything is up to date."),
        }
        return Ok(());
    }

    println!("The following package(s) will be upgraded:");
    print_updates(&updates);

    if !yes && !confirm(format!("Upgrade {} package(s)?", updates.len())).await? {
        println!("Aborted.");
        return Ok(());
    }

    store.cancel_on_interrupt()?;

    let outcome = upgrade_each(&updates, store.interrupted(), |package, version_code| {
        let store = &store;
        async move {
            let done = download_with_progress(store, &package, version_code).await?;
            println!(
                "{} {} upgraded to {}",
                style("✓").green().bold(),
                done.package_name,
                done.version
            );
            Ok::<(), CliError>(())
        }
    })
    .await;

    if outcome.skipped > 0 {
        eprintln!("Interrupted, skipped {} remaining upgrade(s).", outcome.skipped);
    }

    if outcome.failed.is_empty() {
        Ok(())
    } else {
        Err(CliError::Download {
            package: outcome.failed.join(", "),
            reason: format!(
                "{} of {} upgrade(s) failed",
                outcome.failed.len(),
                updates.len()
            ),
        })
    }
}

#[derive(Debug, Default)]
struct UpgradeOutcome {
    failed: Vec<String>,
    skipped: usize,
}

/// Upgrade packages one after another until done or interrupted.
async fn upgrade_each<F, Fut>(
    updates: &[AvailableUpdate],
    interrupted: &AtomicBool,
    mut upgrade: F,
) -> UpgradeOutcome
where
    F: FnMut(String, u64) -> Fut,
    Fut: Future<Output = Result<(), CliError>>,
{
    let mut outcome = UpgradeOutcome::default();
    for (done, update) in updates.iter().enumerate() {
        if interrupted.load(Ordering::SeqCst) {
            outcome.skipped = updates.len() - done;
            break;
        }
        let package = update.package_name().to_string();
        if let Err(e) = upgrade(package.clone(), update.available_version_code()).await {
            eprintln!("{} {}", style("✗").red().bold(), e);
            outcome.failed.push(package);
        }
    }
    outcome
}

/// Narrow the update list to what the user asked for.
fn select_updates(
    updates: Vec<AvailableUpdate>,
    package: Option<&str>,
    all: bool,
) -> Result<Vec<AvailableUpdate>, CliError> {
    match package {
        Some(package) => Ok(updates
            .into_iter()
            .filter(|u| u.package_name() == package)
            .collect()),
        None if all || updates.len() <= 1 => Ok(updates),
        None => Err(CliError::Config(format!(
            "{} updates available; name a package or pass --all",
            updates.len()
        ))),
    }
}

async fn confirm(prompt: String) -> Result<bool, CliError> {
    tokio::task::spawn_blocking(move || {
        Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()
            .map_err(|e| CliError::Prompt(e.to_string()))
    })
    .await
    .map_err(|e| CliError::System(e.to_string()))?
}
