//! Download state and per-package progress.
//!
//! A [`DownloadProgress`] is the unit published to observers: one entry per
//! package with an active or recently finished pipeline.

use std::fmt;

/// Pipeline state.
///
/// ```text
/// Pending → Downloading → Verifying → Installing → Completed
///    │           │            │            │
///    └───────────┴────────────┴────────────┴──► Failed | Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadState {
    Pending,
    Downloading,
    Verifying,
    Installing,
    Completed,
    Failed,
    Cancelled,
}

impl DownloadState {
    /// Whether the state is final.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Downloading => "downloading",
            Self::Verifying => "verifying",
            Self::Installing => "installing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Observable progress of one package's download.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    pub package_name: String,
    pub state: DownloadState,

    /// Fraction of bytes downloaded, in `[0, 1]`.
    ///
    /// Stays at 0 while the total size is unknown.
    pub progress: f32,

    pub bytes_downloaded: u64,

    /// Expected size in bytes; 0 when unknown.
    pub total_bytes: u64,

    /// Identifies the pipeline run that owns this entry.
    pub attempt: u64,
}

impl DownloadProgress {
    /// Fresh entry for an accepted start request.
    pub fn pending(package_name: impl Into<String>, attempt: u64) -> Self {
        Self {
            package_name: package_name.into(),
            state: DownloadState::Pending,
            progress: 0.0,
            bytes_downloaded: 0,
            total_bytes: 0,
            attempt,
        }
    }

    /// Record downloaded bytes against a (possibly unknown) total.
    pub fn record_bytes(&mut self, bytes_downloaded: u64, total_bytes: u64) {
        self.bytes_downloaded = bytes_downloaded;
        self.total_bytes = total_bytes;
        self.progress = if total_bytes == 0 {
            0.0
        } else {
            (bytes_downloaded as f64 / total_bytes as f64).min(1.0) as f32
        };
    }

    /// Progress as a percentage (0 to 100).
    pub fn percent(&self) -> f32 {
        self.progress * 100.0
    }

    /// Whether the owning pipeline has finished.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
