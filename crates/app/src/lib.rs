//! # insights-diag-app
//!
//! The diagnostics core: the throttled diagnostic log, the session loss
//! ledger, the drain bridge, and the page lifecycle hooks that tie them
//! together. This crate depends on `ports`, `domain`, and `shared`.

pub mod diagnostic_log;
pub mod drain;
pub mod lifecycle;
pub mod loss_ledger;

pub use diagnostic_log::{DiagnosticLog, DiagnosticMode, Disposition, RecordOutcome};
pub use drain::{DrainBridge, DrainSummary};
pub use lifecycle::{PageLifecycle, UnloadSummary};
pub use loss_ledger::{LOSS_REPORT_FAILURE_TEXT, LossLedger, LossLedgerDeps, LossReportOutcome};

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use insights_diag_domain::domain_crate_version;
    use insights_diag_ports::ports_crate_version;
    use insights_diag_shared::shared_crate_version;

    #[test]
    fn app_crate_compiles() {
        let version = app_crate_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn app_can_use_ports_domain_shared() {
        assert!(!ports_crate_version().is_empty());
        assert!(!domain_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}
