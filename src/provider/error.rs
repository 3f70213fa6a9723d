use thiserror::Error;

use crate::credentials::CredentialError;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("cannot read video {path}: {source}")]
    Video {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("network error: {0}")]
    Network(reqwest::Error),
    #[error("provider error {code} (HTTP {status}): {message}")]
    Provider {
        status: u16,
        code: String,
        message: String,
    },
    #[error("response has no `{0}` field")]
    MissingField(String),
    #[error("unexpected response: {0}")]
    Protocol(String),
}

// Strip the URL: Instagram requests carry the access token in the query string.
impl From<reqwest::Error> for UploadError {
    fn from(e: reqwest::Error) -> Self {
        UploadError::Network(e.without_url())
    }
}

impl UploadError {
    pub fn video(path: &std::path::Path, source: std::io::Error) -> Self {
        UploadError::Video {
            path: path.display().to_string(),
            source,
        }
    }

    /// Connection failures, timeouts, rate limiting and server errors are transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            UploadError::Network(e) => e.is_timeout() || e.is_connect(),
            UploadError::Provider { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Transient failures where the provider cannot have acted on the request:
    /// the connection was never established, or the request was rate limited.
    pub fn is_retryable_unsent(&self) -> bool {
        match self {
            UploadError::Network(e) => e.is_connect(),
            UploadError::Provider { status, .. } => *status == 429,
            _ => false,
        }
    }
}
