//! # insights-diag-shared
//!
//! Shared result types, error envelope, and redaction helpers for the
//! insights-diagnostics workspace.
//!
//! Every fallible boundary in the workspace returns [`Result`] with an
//! [`ErrorEnvelope`]. The diagnostics subsystem is fail-open, so most of these
//! envelopes are produced, inspected, and then deliberately discarded by the
//! caller rather than surfaced to the host.
//!
//! ## Design Principles
//!
//! 1. **No workspace dependencies** - This crate only depends on external crates
//! 2. **Serde-compatible** - All public types support serialization

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod errors;
pub mod redaction;
pub mod result;

pub use errors::{
    ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata, UnexpectedError, normalize_unexpected_error,
};
pub use redaction::{REDACTED, is_secret_key, redact_if_secret};
pub use result::{Result, ResultExt};

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
