//! HTTP implementation of [`RemoteSource`].

use std::io;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::{FutureExt, TryStreamExt};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tokio_util::io::StreamReader;
use tracing::debug;

use super::error::{RemoteError, RemoteResult};
use super::wire::{AppDetailResponse, AppsListResponse};
use super::{ArtifactStream, RemoteSource};
use crate::package::{ArtifactDetail, CatalogEntry};

/// Default timeout for metadata requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// LelloStore API client.
///
/// The request timeout only applies to connecting and to metadata requests;
/// artifact bodies are streamed without an overall deadline so large
/// downloads are not cut off.
#[derive(Debug, Clone)]
pub struct HttpRemoteSource {
    client: Client,
    base_url: String,
    access_token: Option<String>,
    timeout: Duration,
}

impl HttpRemoteSource {
    /// Create a client for the server at `base_url` with the default timeout.
    pub fn new(base_url: impl Into<String>) -> RemoteResult<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client with a custom timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> RemoteResult<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: None,
            timeout,
        })
    }

    /// Attach a bearer token to every request.
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token.filter(|t| !t.is_empty());
        self
    }

    /// Server base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn catalog_url(&self) -> String {
        format!("{}/api/apps", self.base_url)
    }

    fn artifact_url(&self, package_name: &str) -> String {
        format!("{}/api/apps/{}", self.base_url, package_name)
    }

    fn binary_url(&self, package_name: &str, version_code: u64) -> String {
        format!(
            "{}/api/apps/{}/versions/{}/apk",
            self.base_url, package_name, version_code
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn map_send_error(&self, url: &str, e: reqwest::Error) -> RemoteError {
        if e.is_timeout() {
            RemoteError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            RemoteError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }

    /// Send a request and reject non-success statuses.
    async fn send(&self, url: &str, request: RequestBuilder) -> RemoteResult<Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(url, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(RemoteError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> RemoteResult<T> {
        debug!(url, "Fetching metadata");
        let request = self.client.get(url).timeout(self.timeout);
        let response = self.send(url, request).await?;
        response.json::<T>().await.map_err(|e| RemoteError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

impl RemoteSource for HttpRemoteSource {
    fn fetch_catalog(&self) -> BoxFuture<'_, RemoteResult<Vec<CatalogEntry>>> {
        async move {
            let url = self.catalog_url();
            let response: AppsListResponse = self.get_json(&url).await?;
            Ok(response.apps.into_iter().map(Into::into).collect())
        }
        .boxed()
    }

    fn fetch_artifact<'a>(
        &'a self,
        package_name: &'a str,
    ) -> BoxFuture<'a, RemoteResult<ArtifactDetail>> {
        async move {
            let url = self.artifact_url(package_name);
            let response: AppDetailResponse = self.get_json(&url).await?;
            Ok(response.into())
        }
        .boxed()
    }

    fn open_artifact<'a>(
        &'a self,
        package_name: &'a str,
        version_code: u64,
    ) -> BoxFuture<'a, RemoteResult<ArtifactStream>> {
        async move {
            let url = self.binary_url(package_name, version_code);
            debug!(url, "Opening artifact stream");

            let response = self.send(&url, self.client.get(&url)).await?;
            let content_length = response.content_length();
            let body = response.bytes_stream().map_err(io::Error::other);

            Ok(ArtifactStream::new(StreamReader::new(body), content_length))
        }
        .boxed()
    }
}
