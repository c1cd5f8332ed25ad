//! # insights-diag-testkit
//!
//! Recording test doubles and error fixtures.
//! This crate depends on `ports` and `shared`.

pub mod errors;
pub mod in_memory;
pub mod recording;

pub use in_memory::ScriptedSessionStorage;
pub use recording::{RecordedTrace, RecordingConsole, RecordingReporter, RecordingTraceSink};

/// Returns the testkit crate version.
#[must_use]
pub const fn testkit_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
