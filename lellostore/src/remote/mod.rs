//! Remote catalog source.
//!
//! The [`RemoteSource`] trait is the only way the rest of the crate talks to
//! the catalog server. [`HttpRemoteSource`] implements it over the LelloStore
//! HTTP API; tests plug in in-memory sources.
//!
//! # Endpoints
//!
//! ```text
//! GET /api/apps                                  → catalog listing
//! GET /api/apps/{package}                        → artifact detail
//! GET /api/apps/{package}/versions/{code}/apk    → artifact bytes
//! ```

mod error;
mod http;
mod wire;

pub use error::{RemoteError, RemoteResult};
pub use http::HttpRemoteSource;

use std::fmt;
use std::pin::Pin;

use futures::future::BoxFuture;
use tokio::io::AsyncRead;

use crate::package::{ArtifactDetail, CatalogEntry};

/// An open artifact byte stream.
pub struct ArtifactStream {
    /// Body reader.
    pub reader: Pin<Box<dyn AsyncRead + Send>>,

    /// Body length announced by the server, when known.
    pub content_length: Option<u64>,
}

impl ArtifactStream {
    /// Wrap any async reader.
    pub fn new(reader: impl AsyncRead + Send + 'static, content_length: Option<u64>) -> Self {
        Self {
            reader: Box::pin(reader),
            content_length,
        }
    }
}

impl fmt::Debug for ArtifactStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactStream")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Source of catalog metadata and artifact binaries.
///
/// Uses boxed futures so the trait stays object-safe (`Arc<dyn RemoteSource>`).
pub trait RemoteSource: Send + Sync {
    /// Fetch the catalog listing.
    fn fetch_catalog(&self) -> BoxFuture<'_, RemoteResult<Vec<CatalogEntry>>>;

    /// Fetch the full detail (all versions) of one package.
    ///
    /// Returns [`RemoteError::NotFound`] for unknown packages.
    fn fetch_artifact<'a>(&'a self, package_name: &'a str)
        -> BoxFuture<'a, RemoteResult<ArtifactDetail>>;

    /// Open the binary of one package version.
    ///
    /// A non-success status is reported as an error before any bytes are
    /// returned.
    fn open_artifact<'a>(
        &'a self,
        package_name: &'a str,
        version_code: u64,
    ) -> BoxFuture<'a, RemoteResult<ArtifactStream>>;
}
