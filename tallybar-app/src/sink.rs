//! Display sink and derived presentation values.
//!
//! The poll controller hands every settled cycle to a [`DisplaySink`]:
//! either a [`SnapshotView`] with all derived display fields precomputed,
//! or an error string with an alert flag. The tray frontend is out of
//! scope here; [`TermSink`] renders one status line per update.

use chrono::{DateTime, Local, Utc};
use tracing::warn;

use tallybar_core::{Severity, UsageSnapshot};

// ============================================================================
// Snapshot View
// ============================================================================

/// A snapshot plus everything the display layer derives from it.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotView {
    /// The underlying snapshot.
    pub snapshot: UsageSnapshot,
    /// Alert level from peak utilization.
    pub severity: Severity,
    /// One-line summary in tooltip form.
    pub status_line: String,
    /// Countdown until the 5-hour window resets.
    pub five_hour_remaining: Option<String>,
    /// Countdown until the 7-day window resets.
    pub seven_day_remaining: Option<String>,
    /// Human-readable subscription tier.
    pub tier_label: Option<String>,
}

impl SnapshotView {
    /// Derives all display fields from a snapshot at a given instant.
    pub fn build(snapshot: UsageSnapshot, now: DateTime<Utc>) -> Self {
        let severity = snapshot.severity();
        let five_hour_remaining = snapshot.five_hour.remaining_label(now);
        let seven_day_remaining = snapshot.seven_day.remaining_label(now);
        let tier_label = snapshot.subscription_tier.as_deref().map(format_tier);
        let status_line = status_line(&snapshot, five_hour_remaining.as_deref());

        Self {
            snapshot,
            severity,
            status_line,
            five_hour_remaining,
            seven_day_remaining,
            tier_label,
        }
    }
}

/// Formats the tooltip-style status line:
/// `Claude: 5h 30% | 7d 6% | Resets 2h 14m`.
fn status_line(snapshot: &UsageSnapshot, five_hour_remaining: Option<&str>) -> String {
    let five = percent_label(snapshot.five_hour.utilization);
    let seven = percent_label(snapshot.seven_day.utilization);

    match five_hour_remaining {
        Some(remaining) => format!("Claude: 5h {five} | 7d {seven} | Resets {remaining}"),
        None => format!("Claude: 5h {five} | 7d {seven}"),
    }
}

/// Renders a utilization percentage, or `N/A` for unavailable windows.
fn percent_label(utilization: Option<f64>) -> String {
    match utilization {
        Some(pct) => format!("{pct:.0}%"),
        None => "N/A".to_string(),
    }
}

/// Formats a raw tier identifier for display: `pro` becomes `Pro`,
/// `max_200` becomes `Max 200`.
pub fn format_tier(raw: &str) -> String {
    raw.split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Display Sink
// ============================================================================

/// Receiver for settled fetch cycles.
pub trait DisplaySink: Send {
    /// A successful cycle produced a fresh snapshot.
    fn show_snapshot(&mut self, view: &SnapshotView);

    /// A cycle failed. `alert` is true only for the first failure after a
    /// success; repeated failures update passive status text only.
    fn show_error(&mut self, message: &str, alert: bool);
}

/// Terminal sink: one status line per update.
#[derive(Debug, Default)]
pub struct TermSink;

impl TermSink {
    /// Creates a terminal sink.
    pub fn new() -> Self {
        Self
    }
}

impl DisplaySink for TermSink {
    fn show_snapshot(&mut self, view: &SnapshotView) {
        let stamp = Local::now().format("%H:%M:%S");
        match &view.tier_label {
            Some(tier) => println!(
                "{stamp} [{}] {} ({tier})",
                view.severity.label(),
                view.status_line
            ),
            None => println!("{stamp} [{}] {}", view.severity.label(), view.status_line),
        }
    }

    fn show_error(&mut self, message: &str, alert: bool) {
        let stamp = Local::now().format("%H:%M:%S");
        println!("{stamp} [error] Claude: {message}");
        if alert {
            warn!(error = message, "Claude usage fetch failing");
            eprintln!("Claude Usage Error: {message}");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
