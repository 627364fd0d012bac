//! Image download.

use std::time::Duration;

use ureq::Agent;

/// Default timeout for a single image download.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error downloading a remote image.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection, TLS or timeout failure.
    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },
    /// Server answered with a non-success status.
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    /// Response body could not be read.
    #[error("failed to read response body from {url}: {message}")]
    Body { url: String, message: String },
}

/// Source of remote image bytes.
///
/// The build uses [`UreqFetcher`]; tests substitute in-memory fetchers.
pub trait ImageFetcher: Send + Sync {
    /// Download the resource at `url`.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Create an HTTP agent with a global timeout.
///
/// HTTP status codes are reported as responses, not errors, so callers can
/// map them to [`FetchError::Status`].
#[must_use]
pub fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// [`ImageFetcher`] backed by a blocking ureq agent.
pub struct UreqFetcher {
    agent: Agent,
}

impl UreqFetcher {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: create_agent(timeout),
        }
    }
}

impl Default for UreqFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl ImageFetcher for UreqFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.agent.get(url).call().map_err(|e| FetchError::Http {
            url: url.to_owned(),
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(FetchError::Status {
                url: url.to_owned(),
                status,
            });
        }

        response
            .into_body()
            .with_config()
            .limit(MAX_IMAGE_BYTES)
            .read_to_vec()
            .map_err(|e| FetchError::Body {
                url: url.to_owned(),
                message: e.to_string(),
            })
    }
}

/// Upper bound for a downloaded image body.
const MAX_IMAGE_BYTES: u64 = 50 * 1024 * 1024;
