// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Tallybar Core
//!
//! Core types and time math for the Tallybar usage monitor.
//!
//! This crate provides the foundational pieces used by the fetch and app
//! crates:
//!
//! - [`UsageSnapshot`] - Normalized usage reading with 5-hour/7-day windows
//! - [`RateWindow`] / [`ExtraCredits`] - Snapshot building blocks
//! - [`Severity`] - Derived alert level with 80/95 thresholds
//! - [`Timestamp`] / [`format_remaining`] - Reset-time parsing and
//!   countdown formatting
//! - [`CoreError`] - Error type for core operations

pub mod error;
pub mod time;
pub mod usage;

pub use error::CoreError;
pub use time::{format_duration_secs, format_remaining, Timestamp};
pub use usage::{ExtraCredits, RateWindow, Severity, UsageSnapshot};
