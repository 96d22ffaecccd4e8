//! Usage response parser.
//!
//! Builds a [`UsageSnapshot`] from the raw body of a usage-endpoint
//! response. The schema is fixed and snake_case:
//!
//! ```json
//! {
//!   "five_hour": {"utilization": 30.0, "resets_at": "2025-03-14T12:00:00Z"},
//!   "seven_day": {"utilization": 6.0, "resets_at": "2025-03-18T00:00:00Z"},
//!   "seven_day_opus": {"utilization": 2.0},
//!   "seven_day_sonnet": {"utilization": 4.5},
//!   "extra_usage": {"monthly_limit": 10000, "used_credits": 250}
//! }
//! ```
//!
//! Missing or null fields become "unavailable" sentinels, never errors;
//! only an unparsable document is a hard failure.

use serde_json::Value;
use tracing::warn;

use tallybar_core::{ExtraCredits, RateWindow, Timestamp, UsageSnapshot};

use crate::error::FetchError;

/// Parses a usage response body into a snapshot.
///
/// # Errors
///
/// Returns `FetchError::MalformedJson` if the body is not valid JSON.
/// Missing fields of an otherwise valid document are tolerated.
pub fn parse_usage_response(body: &str) -> Result<UsageSnapshot, FetchError> {
    let root: Value =
        serde_json::from_str(body).map_err(|e| FetchError::MalformedJson(e.to_string()))?;

    let mut snapshot = UsageSnapshot::new();
    snapshot.five_hour = parse_window(root.get("five_hour"));
    snapshot.seven_day = parse_window(root.get("seven_day"));
    snapshot.opus_utilization = parse_sub_limit(root.get("seven_day_opus"));
    snapshot.sonnet_utilization = parse_sub_limit(root.get("seven_day_sonnet"));
    snapshot.extra = parse_extra_usage(root.get("extra_usage"));

    Ok(snapshot)
}

/// Reads `utilization` and `resets_at` from a window object.
fn parse_window(field: Option<&Value>) -> RateWindow {
    let Some(field) = field.filter(|v| !v.is_null()) else {
        return RateWindow::unavailable();
    };

    let utilization = field.get("utilization").and_then(Value::as_f64);

    let resets_at = field
        .get("resets_at")
        .and_then(Value::as_str)
        .and_then(|s| match Timestamp::parse(s) {
            Ok(ts) => Some(ts),
            Err(e) => {
                // A bad reset time only costs the countdown, not the window.
                warn!(error = %e, "Unparsable reset timestamp");
                None
            }
        });

    RateWindow {
        utilization,
        resets_at,
    }
}

/// Reads `utilization` from a per-model sub-limit object.
fn parse_sub_limit(field: Option<&Value>) -> Option<f64> {
    field
        .filter(|v| !v.is_null())?
        .get("utilization")
        .and_then(Value::as_f64)
}

/// Reads the extra-usage block; its presence means the overage feature
/// is enabled, values defaulting to zero cents.
fn parse_extra_usage(field: Option<&Value>) -> Option<ExtraCredits> {
    let field = field.filter(|v| !v.is_null())?;
    Some(ExtraCredits {
        limit_cents: field
            .get("monthly_limit")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        used_cents: field
            .get("used_credits")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
    })
}

// ============================================================================
// Tests
// ============================================================================
