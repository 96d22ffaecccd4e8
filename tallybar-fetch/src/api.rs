//! Usage fetch orchestration.
//!
//! Combines the HTTP client and the response parser into one call:
//!
//! ```text
//! GET https://api.anthropic.com/api/oauth/usage
//! Authorization: Bearer <access_token>
//! anthropic-beta: oauth-2025-04-20
//! Accept: application/json
//! ```
//!
//! The returned snapshot has `subscription_tier` left empty; the caller
//! merges the tier from the credential source before display.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use tracing::{debug, instrument, warn};

use tallybar_core::UsageSnapshot;

use crate::client::{HttpClient, HttpResponse};
use crate::error::FetchError;
use crate::parser::parse_usage_response;

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the Anthropic API.
pub const API_BASE_URL: &str = "https://api.anthropic.com";

/// OAuth usage endpoint.
pub const USAGE_ENDPOINT: &str = "/api/oauth/usage";

/// Beta feature flag required by the OAuth usage endpoint.
pub const OAUTH_BETA: &str = "oauth-2025-04-20";

/// Bodies beyond this size are discarded as anomalous; the real response
/// is a few hundred bytes.
const MAX_BODY_BYTES: usize = 1024 * 1024;

// ============================================================================
// Usage Source
// ============================================================================

/// Seam between the poll controller and the network.
///
/// The controller only needs one operation; test doubles implement it
/// without touching the network.
pub trait UsageSource: Send + Sync {
    /// Fetches one usage snapshot with the given bearer token.
    fn fetch_usage(
        &self,
        access_token: &str,
    ) -> impl std::future::Future<Output = Result<UsageSnapshot, FetchError>> + Send;
}

// ============================================================================
// Usage Client
// ============================================================================

/// Client for the usage endpoint.
#[derive(Debug, Clone)]
pub struct UsageClient {
    http: HttpClient,
    base_url: String,
}

impl UsageClient {
    /// Creates a client against the production endpoint.
    pub fn new() -> Self {
        Self::with_base_url(API_BASE_URL)
    }

    /// Creates a client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for UsageClient {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageSource for UsageClient {
    #[instrument(skip(self, access_token))]
    async fn fetch_usage(&self, access_token: &str) -> Result<UsageSnapshot, FetchError> {
        let url = format!("{}{}", self.base_url, USAGE_ENDPOINT);
        let headers = request_headers(access_token)?;

        debug!(url = %url, "Fetching usage");

        let response = self.http.get_with_headers(&url, headers).await?;
        map_response(&response)
    }
}

/// Builds the fixed request header set.
fn request_headers(access_token: &str) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    let bearer = HeaderValue::from_str(&format!("Bearer {access_token}"))
        .map_err(|_| FetchError::MissingToken)?;
    headers.insert(AUTHORIZATION, bearer);
    headers.insert("anthropic-beta", HeaderValue::from_static(OAUTH_BETA));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Maps a completed HTTP exchange to a snapshot or a classified error.
///
/// Status takes precedence over body content: a 401 is `AuthExpired` even
/// when the body happens to be valid JSON.
fn map_response(response: &HttpResponse) -> Result<UsageSnapshot, FetchError> {
    match response.status {
        200 => {}
        401 => return Err(FetchError::AuthExpired),
        403 => return Err(FetchError::AccessDenied),
        status => {
            warn!(status, "Usage endpoint returned error status");
            return Err(FetchError::HttpStatus(status));
        }
    }

    if response.body.is_empty() {
        return Err(FetchError::EmptyBody);
    }

    if response.body.len() > MAX_BODY_BYTES {
        warn!(len = response.body.len(), "Discarding anomalously large body");
        return Err(FetchError::MalformedJson(format!(
            "response body of {} bytes exceeds limit",
            response.body.len()
        )));
    }

    parse_usage_response(&response.body)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_map_200_parses_body() {
        let snapshot =
            map_response(&response(200, r#"{"five_hour": {"utilization": 12.0}}"#)).unwrap();
        assert_eq!(snapshot.five_hour.utilization, Some(12.0));
    }

    #[test]
    fn test_map_401_wins_over_valid_body() {
        let err = map_response(&response(401, r#"{"five_hour": {"utilization": 12.0}}"#));
        assert_eq!(err.unwrap_err(), FetchError::AuthExpired);
    }

    #[test]
    fn test_map_403_is_access_denied() {
        let err = map_response(&response(403, ""));
        assert_eq!(err.unwrap_err(), FetchError::AccessDenied);
    }

    #[test]
    fn test_map_other_status_carries_code() {
        let err = map_response(&response(500, "oops"));
        assert_eq!(err.unwrap_err(), FetchError::HttpStatus(500));
        let err = map_response(&response(429, ""));
        assert_eq!(err.unwrap_err(), FetchError::HttpStatus(429));
    }

    #[test]
    fn test_map_200_empty_body() {
        let err = map_response(&response(200, ""));
        assert_eq!(err.unwrap_err(), FetchError::EmptyBody);
    }

    #[test]
    fn test_map_200_garbage_body() {
        let err = map_response(&response(200, "<html>downtime</html>"));
        assert!(matches!(err.unwrap_err(), FetchError::MalformedJson(_)));
    }

    #[test]
    fn test_map_200_oversized_body() {
        let body = "x".repeat(MAX_BODY_BYTES + 1);
        let err = map_response(&response(200, &body));
        assert!(matches!(err.unwrap_err(), FetchError::MalformedJson(_)));
    }

    #[test]
    fn test_request_headers() {
        let headers = request_headers("sk-ant-oat01-test").unwrap();
        assert_eq!(
            headers.get(AUTHORIZATION).unwrap(),
            "Bearer sk-ant-oat01-test"
        );
        assert_eq!(headers.get("anthropic-beta").unwrap(), OAUTH_BETA);
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/json");
    }

    #[test]
    fn test_request_headers_reject_control_chars() {
        assert!(request_headers("bad\ntoken").is_err());
    }
}
