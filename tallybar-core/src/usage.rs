//! Usage snapshot models.
//!
//! This module contains the normalized usage types:
//! - [`UsageSnapshot`] - One complete usage reading
//! - [`RateWindow`] - A rolling rate-limit window (5-hour, 7-day)
//! - [`ExtraCredits`] - Pay-per-use overage balance
//! - [`Severity`] - Derived tray/alert level

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::time::{format_remaining, Timestamp};

// ============================================================================
// Rate Windows
// ============================================================================

/// A rolling rate-limit window.
///
/// `utilization` is `None` when the API omitted or nulled the window —
/// "unavailable" is a distinct state from zero usage and is preserved
/// end-to-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateWindow {
    /// Percentage of the window consumed (0-100), if reported.
    pub utilization: Option<f64>,
    /// When this window resets.
    pub resets_at: Option<Timestamp>,
}

impl RateWindow {
    /// A window with no data from the API.
    pub fn unavailable() -> Self {
        Self {
            utilization: None,
            resets_at: None,
        }
    }

    /// Returns true if the API reported a utilization for this window.
    pub fn is_available(&self) -> bool {
        self.utilization.is_some()
    }

    /// Countdown string until this window resets, if a reset time is known.
    pub fn remaining_label(&self, now: DateTime<Utc>) -> Option<String> {
        self.resets_at.as_ref().map(|t| format_remaining(t, now))
    }
}

impl Default for RateWindow {
    fn default() -> Self {
        Self::unavailable()
    }
}

// ============================================================================
// Extra Credits
// ============================================================================

/// Extra-usage credit balance, present only when the account has the
/// overage feature enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraCredits {
    /// Monthly spending limit in cents.
    pub limit_cents: f64,
    /// Credits used this month in cents.
    pub used_cents: f64,
}

impl ExtraCredits {
    /// Used balance in dollars.
    pub fn used_dollars(&self) -> f64 {
        self.used_cents / 100.0
    }

    /// Monthly limit in dollars.
    pub fn limit_dollars(&self) -> f64 {
        self.limit_cents / 100.0
    }
}

// ============================================================================
// Severity
// ============================================================================

/// Derived alert level computed from peak utilization across windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Usage below 80%.
    Normal,
    /// Usage at or above 80%.
    Warning,
    /// Usage at or above 95%.
    Critical,
}

impl Severity {
    /// Maps a utilization percentage to a severity level.
    ///
    /// Thresholds are boundary-inclusive on the higher state: exactly 80
    /// is `Warning`, exactly 95 is `Critical`.
    pub fn from_utilization(percent: f64) -> Self {
        if percent >= 95.0 {
            Self::Critical
        } else if percent >= 80.0 {
            Self::Warning
        } else {
            Self::Normal
        }
    }

    /// Lowercase label used in status output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

// ============================================================================
// Usage Snapshot
// ============================================================================

/// One complete, internally consistent usage reading.
///
/// A snapshot is immutable once built; each fetch cycle replaces the
/// previous snapshot wholesale. A fetch that fails produces a
/// `FetchError` instead of a snapshot — never a half-populated one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// 5-hour session window.
    pub five_hour: RateWindow,
    /// 7-day window (all models).
    pub seven_day: RateWindow,
    /// 7-day Opus sub-limit, if the payload includes one.
    pub opus_utilization: Option<f64>,
    /// 7-day Sonnet sub-limit, if the payload includes one.
    pub sonnet_utilization: Option<f64>,
    /// Extra-usage credits, if the overage feature is enabled.
    pub extra: Option<ExtraCredits>,
    /// Raw subscription tier identifier (e.g., "pro", "max_200").
    ///
    /// Read from the local credential file, not from the usage response;
    /// the poll controller merges it in after a successful fetch.
    pub subscription_tier: Option<String>,
    /// When this snapshot was built.
    pub updated_at: DateTime<Utc>,
}

impl UsageSnapshot {
    /// Creates an empty snapshot with every field unavailable.
    pub fn new() -> Self {
        Self {
            five_hour: RateWindow::unavailable(),
            seven_day: RateWindow::unavailable(),
            opus_utilization: None,
            sonnet_utilization: None,
            extra: None,
            subscription_tier: None,
            updated_at: Utc::now(),
        }
    }

    /// Attaches the subscription tier read from the credential source.
    pub fn with_tier(mut self, tier: Option<String>) -> Self {
        self.subscription_tier = tier;
        self
    }

    /// Peak utilization across the 5-hour and 7-day windows.
    pub fn max_utilization(&self) -> Option<f64> {
        match (self.five_hour.utilization, self.seven_day.utilization) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    /// Severity derived from peak utilization.
    ///
    /// A snapshot with both windows unavailable reads as `Normal`.
    pub fn severity(&self) -> Severity {
        self.max_utilization()
            .map_or(Severity::Normal, Severity::from_utilization)
    }

    /// Serializes the snapshot for logging/display.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Rebuilds a snapshot from its logged JSON form.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Serialization` on malformed input.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for UsageSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
