//! LelloStore - private application distribution client
//!
//! This library fetches a catalog of installable artifacts from a LelloStore
//! server, downloads and verifies specific artifact versions, hands them to a
//! platform installer and reports updates for already-installed artifacts.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        DownloadCoordinator                        │
//! │   registry (package → active pipeline)     ProgressMap (watch)    │
//! │            │                                      ▲               │
//! │            ▼                                      │               │
//! │   DownloadPipeline ── resolve ── stream ── verify ── install      │
//! │        │                 │          │                  │          │
//! │        ▼                 ▼          ▼                  ▼          │
//! │  CatalogRepository   RemoteSource  checksum     PlatformInstaller │
//! └──────────────────────────────────────────────────────────────────┘
//!
//!   CatalogRepository::watch_catalog ──┐
//!                                      ├──► UpdateDetector ──► available updates
//!   InstalledRepository::watch_installed ┘
//! ```
//!
//! All collaborators sit behind traits so the pipeline and the update
//! detector can be driven by in-memory fakes in tests.

pub mod catalog;
pub mod config;
pub mod download;
pub mod installed;
pub mod installer;
pub mod logging;
pub mod package;
pub mod remote;
pub mod updates;
