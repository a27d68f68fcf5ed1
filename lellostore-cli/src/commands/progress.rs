//! Download progress rendering.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use lellostore::download::{CompletedDownload, DownloadProgress};
use tracing::debug;

use super::Store;
use crate::error::CliError;

const BAR_TEMPLATE: &str =
    "{spinner:.green} {msg:32} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({eta})";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg:32} {bytes}";

/// Run one download through the coordinator, rendering its progress entry.
///
/// Failures are reported with their short user-facing reason; the detailed
/// cause goes to the log.
pub async fn download_with_progress(
    store: &Store,
    package: &str,
    version_code: u64,
) -> Result<CompletedDownload, CliError> {
    let bar = ProgressBar::new(0);
    bar.set_style(style(SPINNER_TEMPLATE));
    bar.set_message(format!("{} pending", package));
    bar.enable_steady_tick(Duration::from_millis(120));

    let mut rx = store.coordinator.active_downloads();
    let coordinator = store.coordinator.clone();
    let owned = package.to_string();
    let mut task = tokio::spawn(async move { coordinator.start(&owned, version_code).await });

    let joined = loop {
        tokio::select! {
            joined = &mut task => break joined,
            changed = rx.changed() => {
                if changed.is_err() {
                    break (&mut task).await;
                }
                let entry = rx.borrow_and_update().get(package).cloned();
                if let Some(progress) = entry {
                    render(&bar, &progress);
                }
            }
        }
    };
    bar.finish_and_clear();

    let result =
        joined.map_err(|e| CliError::System(format!("Download task failed: {}", e)))?;
    result.map_err(|e| {
        debug!(package, error = %e, "Download did not complete");
        CliError::Download {
            package: package.to_string(),
            reason: e.short_reason().to_string(),
        }
    })
}

fn render(bar: &ProgressBar, progress: &DownloadProgress) {
    if progress.total_bytes > 0 && bar.length() != Some(progress.total_bytes) {
        bar.set_length(progress.total_bytes);
        bar.set_style(style(BAR_TEMPLATE).progress_chars("#>-"));
    }
    bar.set_position(progress.bytes_downloaded);
    bar.set_message(format!("{} {}", progress.package_name, progress.state));
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_spinner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lellostore::download::DownloadState;

    #[test]
    fn test_templates_parse() {
        assert!(ProgressStyle::with_template(BAR_TEMPLATE).is_ok());
        assert!(ProgressStyle::with_template(SPINNER_TEMPLATE).is_ok());
    }

    #[test]
    fn test_render_switches_to_bar_when_total_known() {
        let bar = ProgressBar::hidden();
        let mut progress = DownloadProgress::pending("com.test.app", 1);
        progress.state = DownloadState::Downloading;
        progress.record_bytes(512, 2048);

        render(&bar, &progress);

        assert_eq!(bar.length(), Some(2048));
        assert_eq!(bar.position(), 512);
    }
}
