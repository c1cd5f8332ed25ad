//! # insights-diag-infra
//!
//! Infrastructure wiring and runtime composition.
//! This crate depends on `app`, `adapters`, `config`, and `shared`.

/// Local CLI orchestration helpers.
pub mod cli_local;
/// Config loading helpers used by CLI surfaces.
pub mod config_check;
/// Environment validation helpers used by CLI surfaces.
pub mod env_check;
/// Timed drain and loss-check pump.
pub mod pump;
/// Composition root.
pub mod runtime;

pub use cli_local::{
    LedgerReportResult, LedgerStatus, SimulateOptions, SimulateSummary, run_ledger_confirm,
    run_ledger_enqueue, run_ledger_report, run_ledger_reset, run_ledger_status, run_pump_for,
    run_simulate,
};
pub use config_check::{
    ConfigOutputFormat, config_schema_json, load_effective_config, render_effective_config,
};
pub use env_check::{InfraError, InfraResult, validate_env_parsing};
pub use pump::{PumpIntervals, PumpReport, run_pump, spawn_pump};
pub use runtime::{DiagnosticsRuntime, RuntimeAdapters};

// Re-exports for the CLI boundary
pub use insights_diag_adapters::{LogSink, MemoryLogSink};
pub use insights_diag_config::{ENV_VARS, ValidatedDiagnosticsConfig};
pub use insights_diag_shared::{is_secret_key, redact_if_secret};

/// Returns the infra crate version.
#[must_use]
pub const fn infra_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
