//! Download and install pipeline.
//!
//! [`DownloadCoordinator`] is the entry point: it accepts start and cancel
//! requests, guarantees at most one active pipeline per package and exposes
//! an observable progress map. Each accepted request runs a pipeline on its
//! own task that resolves metadata, streams the artifact into a staging file,
//! verifies its SHA-256 digest and hands it to the platform installer.

mod checksum;
mod coordinator;
mod error;
mod pipeline;
mod progress;
mod staging;
mod state;

pub use checksum::{calculate_file_checksum, digests_match};
pub use coordinator::{DownloadConfig, DownloadCoordinator, DEFAULT_GRACE_PERIOD};
pub use error::{DownloadError, DownloadResult, StartResult, ALREADY_IN_PROGRESS};
pub use pipeline::{CompletedDownload, PipelineContext, DEFAULT_CHUNK_SIZE};
pub use progress::{ProgressMap, ProgressSnapshot};
pub use state::{DownloadProgress, DownloadState};
