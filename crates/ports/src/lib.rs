//! # insights-diag-ports
//!
//! Port traits for the insights-diagnostics hexagonal architecture.
//!
//! This crate defines the collaborator contracts the diagnostics core talks
//! to: the host console, session storage, the loss reporter, and the trace
//! sink the drain bridge feeds. It depends only on `domain` and `shared`.

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod console;
pub mod reporter;
pub mod storage;
pub mod trace;

pub use console::*;
pub use reporter::*;
pub use storage::*;
pub use trace::*;

// Re-export domain types used in port signatures, so adapter crates can
// implement ports without directly depending on `insights-diag-domain`.
pub use insights_diag_domain::{DiagnosticMessage, MessageProperties};
