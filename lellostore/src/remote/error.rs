//! Error types for the remote catalog source.

use thiserror::Error;

/// Result type for remote source operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors raised while talking to the catalog server.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request could not be sent or the body could not be read.
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    /// The requested resource does not exist on the server.
    #[error("{url} not found")]
    NotFound { url: String },

    /// The request timed out.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// The response body did not match the wire format.
    #[error("failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl RemoteError {
    /// Whether the server reported that the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = RemoteError::Status {
            url: "http://store/api/apps".to_string(),
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "request to http://store/api/apps returned status 503"
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(RemoteError::NotFound {
            url: "x".to_string()
        }
        .is_not_found());
        assert!(!RemoteError::Client("boom".to_string()).is_not_found());
    }
}
