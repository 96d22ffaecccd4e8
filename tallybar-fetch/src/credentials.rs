//! Credential file access.
//!
//! Claude Code stores OAuth credentials at `~/.claude/.credentials.json`:
//!
//! ```json
//! {
//!   "claudeAiOauth": {
//!     "accessToken": "sk-ant-oat01-...",
//!     "subscriptionType": "max_200"
//!   }
//! }
//! ```
//!
//! The token is rotated externally by Claude Code, so the poll controller
//! re-reads this file before every fetch cycle instead of caching it.

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::FetchError;

// ============================================================================
// Credentials
// ============================================================================

/// Token and tier read fresh for one fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// OAuth bearer token.
    pub access_token: String,
    /// Subscription tier identifier (e.g., "pro", "max_200"), if present.
    pub subscription_tier: Option<String>,
}

/// Source of the bearer token and subscription tier.
///
/// Behind a trait so poll-controller tests can swap in a stub.
pub trait CredentialSource: Send + Sync {
    /// Reads current credentials.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::MissingToken` when no usable token exists —
    /// a per-cycle failure, retried next cycle in case the file is fixed
    /// externally.
    fn load(&self) -> Result<Credentials, FetchError>;
}

// ============================================================================
// Credentials File
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsFile {
    claude_ai_oauth: Option<OAuthData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OAuthData {
    access_token: Option<String>,
    subscription_type: Option<String>,
}

/// File-backed credential source.
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    /// Creates a source reading the given credentials file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default Claude Code credentials location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".claude").join(".credentials.json"))
    }
}

impl CredentialSource for FileCredentials {
    fn load(&self) -> Result<Credentials, FetchError> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "Cannot read credentials file");
            FetchError::MissingToken
        })?;

        debug!(path = %self.path.display(), "Read credentials file");
        parse_credentials(&content)
    }
}

/// Extracts token and tier from credentials JSON.
fn parse_credentials(json: &str) -> Result<Credentials, FetchError> {
    let file: CredentialsFile = serde_json::from_str(json).map_err(|e| {
        warn!(error = %e, "Credentials file is not valid JSON");
        FetchError::MissingToken
    })?;

    let oauth = file.claude_ai_oauth.ok_or(FetchError::MissingToken)?;
    let access_token = oauth
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or(FetchError::MissingToken)?;

    Ok(Credentials {
        access_token,
        subscription_tier: oauth.subscription_type,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_credentials() {
        let json = r#"{
            "claudeAiOauth": {
                "accessToken": "sk-ant-oat01-test",
                "refreshToken": "unused-here",
                "subscriptionType": "max_200"
            }
        }"#;

        let creds = parse_credentials(json).unwrap();
        assert_eq!(creds.access_token, "sk-ant-oat01-test");
        assert_eq!(creds.subscription_tier.as_deref(), Some("max_200"));
    }

    #[test]
    fn test_parse_missing_tier_is_fine() {
        let json = r#"{"claudeAiOauth": {"accessToken": "tok"}}"#;
        let creds = parse_credentials(json).unwrap();
        assert_eq!(creds.access_token, "tok");
        assert!(creds.subscription_tier.is_none());
    }

    #[test]
    fn test_parse_missing_token() {
        assert_eq!(
            parse_credentials("{}").unwrap_err(),
            FetchError::MissingToken
        );
        assert_eq!(
            parse_credentials(r#"{"claudeAiOauth": {}}"#).unwrap_err(),
            FetchError::MissingToken
        );
        assert_eq!(
            parse_credentials(r#"{"claudeAiOauth": {"accessToken": ""}}"#).unwrap_err(),
            FetchError::MissingToken
        );
    }

    #[test]
    fn test_parse_garbage_file() {
        assert_eq!(
            parse_credentials("not json at all").unwrap_err(),
            FetchError::MissingToken
        );
    }

    #[test]
    fn test_load_missing_file() {
        let source = FileCredentials::new("/nonexistent/credentials.json");
        assert_eq!(source.load().unwrap_err(), FetchError::MissingToken);
    }
}
