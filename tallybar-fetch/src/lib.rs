// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Tallybar Fetch
//!
//! Network and credential plumbing for the Tallybar usage monitor.
//!
//! This crate turns one HTTPS round trip into a normalized
//! [`tallybar_core::UsageSnapshot`] or a classified [`FetchError`]:
//!
//! - [`client::HttpClient`] - GET with staged timeouts and transport
//!   classification
//! - [`parser`] - fixed-schema response parsing with "unavailable"
//!   sentinels for missing fields
//! - [`api::UsageClient`] - the one-call orchestrator, behind the
//!   [`UsageSource`] seam
//! - [`credentials`] - fresh-per-cycle token and tier reads, behind the
//!   [`CredentialSource`] seam
//!
//! Retry policy lives with the caller: nothing in this crate retries.

pub mod api;
pub mod client;
pub mod credentials;
pub mod error;
pub mod parser;

pub use api::{UsageClient, UsageSource, API_BASE_URL, USAGE_ENDPOINT};
pub use client::{HttpClient, HttpResponse};
pub use credentials::{CredentialSource, Credentials, FileCredentials};
pub use error::FetchError;
pub use parser::parse_usage_response;
