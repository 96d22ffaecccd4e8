//! HTTP client with staged timeouts and transport classification.

use reqwest::header::HeaderMap;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::error::FetchError;

/// Connect timeout, covering name resolution and the TCP/TLS handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Read timeout for receiving the response.
const READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Backstop for the whole request, send included.
const TOTAL_TIMEOUT: Duration = Duration::from_secs(45);

/// User agent string for Tallybar.
const USER_AGENT: &str = concat!("Tallybar/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Response
// ============================================================================

/// Status code and full body of a completed request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, read to completion.
    pub body: String,
}

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper over a pooled `reqwest::Client`.
///
/// The pool keeps connections alive between poll cycles as an
/// optimization; every call is still independently retryable and closes
/// its resources on all exit paths.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    /// Creates a new HTTP client with the fixed fetch timeouts.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built. This should only occur
    /// if the system's TLS configuration is fundamentally broken, making
    /// network operations impossible. This is considered unrecoverable
    /// at runtime.
    pub fn new() -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .timeout(TOTAL_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                panic!(
                    "Failed to create HTTP client: {e}. \
                    This usually indicates a broken TLS configuration."
                )
            });

        Self { inner: client }
    }

    /// Performs a GET request and reads the body to completion.
    ///
    /// Transport failures are classified into [`FetchError`] variants;
    /// the status code is returned as data, not as an error.
    #[instrument(skip(self, headers), fields(url = %url))]
    pub async fn get_with_headers(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<HttpResponse, FetchError> {
        let host = host_of(url);
        debug!("GET request");

        let response = self
            .inner
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| FetchError::from_transport(&host, &e))?;

        let status = response.status().as_u16();

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_transport(&host, &e))?;

        debug!(status, len = body.len(), "Response received");

        Ok(HttpResponse { status, body })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Host portion of a URL, for error messages.
fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_of() {
        assert_eq!(
            host_of("https://api.anthropic.com/api/oauth/usage"),
            "api.anthropic.com"
        );
        // Unparsable URLs fall back to the raw string
        assert_eq!(host_of("not a url"), "not a url");
    }
}
