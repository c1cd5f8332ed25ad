//! # insights-diag-domain
//!
//! Value types for the internal diagnostics subsystem:
//!
//! - **Messages** - `DiagnosticMessage`, `MessageProperties`
//! - **Severity** - `Severity`, `Actionability` and their text prefixes
//! - **Limits** - `ThrottleLimit`, `ReportLimit`
//! - **Ledger** - persisted counter keys and decimal codec
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - No infrastructure or adapter dependencies
//! - Pure domain logic with no I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub use insights_diag_shared::shared_crate_version;

pub mod ledger;
pub mod limits;
pub mod message;
pub mod severity;

pub use ledger::{LedgerKey, format_counter, loss_report_text, parse_counter};
pub use limits::{
    DEFAULT_REPORT_LIMIT, DEFAULT_THROTTLE_LIMIT, LimitError, ReportLimit, ThrottleLimit,
};
pub use message::{DiagnosticMessage, MessageProperties, THROTTLE_SENTINEL_TEXT};
pub use severity::{Actionability, NON_USER_ACTIONABLE_PREFIX, Severity, USER_ACTIONABLE_PREFIX};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
