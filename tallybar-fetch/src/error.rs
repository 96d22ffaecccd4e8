//! Fetch error types.
//!
//! Every failure mode of a fetch cycle is classified into one
//! [`FetchError`] variant so the poll controller can show a specific
//! message. No variant is fatal: all of them are retried on the next
//! scheduled cycle.

use thiserror::Error;

// ============================================================================
// Fetch Error
// ============================================================================

/// Error type for fetch operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// TCP connection to the API host could not be established.
    #[error("Cannot connect to {0}")]
    NetworkUnreachable(String),

    /// A request stage exceeded its timeout.
    #[error("Request timed out")]
    Timeout,

    /// Name resolution failed.
    #[error("DNS resolution failed")]
    DnsFailure,

    /// The API rejected the bearer token (HTTP 401).
    #[error("Token expired - reopen Claude Code")]
    AuthExpired,

    /// The token lacks access to the usage endpoint (HTTP 403).
    #[error("Access denied")]
    AccessDenied,

    /// Any other non-200 status.
    #[error("API error (HTTP {0})")]
    HttpStatus(u16),

    /// A 200 response with no body.
    #[error("Empty response")]
    EmptyBody,

    /// The response body was not a parsable document.
    #[error("JSON parse error: {0}")]
    MalformedJson(String),

    /// Transport failure that fits no more specific variant.
    #[error("Network error: {0}")]
    Transport(String),

    /// No access token could be read from the credential source.
    #[error("No access token found")]
    MissingToken,
}

impl FetchError {
    /// Classifies a `reqwest` transport error.
    ///
    /// `host` is used for the unreachable-host message only.
    pub(crate) fn from_transport(host: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        if is_dns_failure(err) {
            return Self::DnsFailure;
        }
        if err.is_connect() {
            return Self::NetworkUnreachable(host.to_string());
        }
        Self::Transport(err.to_string())
    }
}

/// Walks the error source chain looking for a name-resolution failure.
///
/// Neither reqwest nor hyper expose DNS errors as a typed variant; they
/// surface as a connect error whose source mentions the lookup.
fn is_dns_failure(err: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        let text = inner.to_string().to_ascii_lowercase();
        if text.contains("dns") || text.contains("failed to lookup address") {
            return true;
        }
        source = inner.source();
    }
    false
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(
            FetchError::NetworkUnreachable("api.anthropic.com".to_string()).to_string(),
            "Cannot connect to api.anthropic.com"
        );
        assert_eq!(FetchError::Timeout.to_string(), "Request timed out");
        assert_eq!(FetchError::DnsFailure.to_string(), "DNS resolution failed");
        assert_eq!(
            FetchError::AuthExpired.to_string(),
            "Token expired - reopen Claude Code"
        );
        assert_eq!(FetchError::AccessDenied.to_string(), "Access denied");
        assert_eq!(
            FetchError::HttpStatus(503).to_string(),
            "API error (HTTP 503)"
        );
        assert_eq!(FetchError::EmptyBody.to_string(), "Empty response");
        assert_eq!(
            FetchError::MissingToken.to_string(),
            "No access token found"
        );
    }
}
