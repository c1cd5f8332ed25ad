//! Page lifecycle hooks tying the log, the ledger, and the drain together.

use crate::diagnostic_log::DiagnosticLog;
use crate::drain::{DrainBridge, DrainSummary};
use crate::loss_ledger::{LossLedger, LossReportOutcome};
use std::sync::Arc;

/// Result of the unload pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnloadSummary {
    /// Final loss check.
    pub loss: LossReportOutcome,
    /// Final drain, which also carries any failure the loss check recorded.
    pub drained: DrainSummary,
}

/// Host-facing entry points for page view boundaries and the send pipeline.
#[derive(Debug, Clone)]
pub struct PageLifecycle {
    log: Arc<DiagnosticLog>,
    ledger: Arc<LossLedger>,
    drain: DrainBridge,
}

impl PageLifecycle {
    /// Wire the lifecycle over shared components.
    #[must_use]
    pub const fn new(log: Arc<DiagnosticLog>, ledger: Arc<LossLedger>, drain: DrainBridge) -> Self {
        Self { log, ledger, drain }
    }

    /// The shared diagnostic log.
    #[must_use]
    pub const fn log(&self) -> &Arc<DiagnosticLog> {
        &self.log
    }

    /// The shared loss ledger.
    #[must_use]
    pub const fn ledger(&self) -> &Arc<LossLedger> {
        &self.ledger
    }

    /// Start a new page view: reset the throttle and the queued item count.
    pub fn begin_page_view(&self) {
        self.log.reset_throttle_count();
        self.ledger.reset_queue_count();
    }

    /// An item entered the outbound send pipeline.
    pub fn on_item_enqueued(&self) {
        self.ledger.increment_queued();
    }

    /// A batch of `count` items was confirmed sent.
    pub fn on_batch_sent(&self, count: u64) {
        self.ledger.decrement_queued(count);
    }

    /// Periodic drain.
    pub fn drain(&self) -> DrainSummary {
        self.drain.drain()
    }

    /// Periodic loss check.
    pub fn check_loss(&self) -> LossReportOutcome {
        self.ledger.report_lost_items_if_any()
    }

    /// Final pass before the page goes away: loss check, then drain.
    pub fn unload(&self) -> UnloadSummary {
        let loss = self.check_loss();
        let drained = self.drain();
        tracing::debug!(?loss, emitted = drained.emitted, "unload pass complete");
        UnloadSummary { loss, drained }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss_ledger::LossLedgerDeps;
    use insights_diag_domain::{ReportLimit, Severity, ThrottleLimit};
    use insights_diag_shared::{ErrorEnvelope, Result};
    use insights_diag_testkit::{RecordingReporter, RecordingTraceSink, ScriptedSessionStorage};

    use crate::diagnostic_log::DiagnosticMode;

    struct Fixture {
        reporter: Arc<RecordingReporter>,
        sink: Arc<RecordingTraceSink>,
        lifecycle: PageLifecycle,
    }

    fn fixture(throttle: u32) -> Result<Fixture> {
        let log = Arc::new(DiagnosticLog::new(
            DiagnosticMode::production(),
            ThrottleLimit::new(throttle).map_err(ErrorEnvelope::from)?,
            None,
        ));
        let reporter = Arc::new(RecordingReporter::new());
        let sink = Arc::new(RecordingTraceSink::new());
        let ledger = Arc::new(LossLedger::new(
            LossLedgerDeps {
                storage: Some(Arc::new(ScriptedSessionStorage::new())),
                reporter: Some(reporter.clone()),
                log: Arc::clone(&log),
            },
            ReportLimit::default(),
        ));
        let drain = DrainBridge::new(Arc::clone(&log), sink.clone());
        Ok(Fixture {
            reporter,
            sink,
            lifecycle: PageLifecycle::new(log, ledger, drain),
        })
    }

    #[test]
    fn begin_page_view_resets_both_scopes() -> Result<()> {
        let fx = fixture(1)?;
        let log = fx.lifecycle.log();
        let _ = log.report_user_actionable(Severity::Critical, "a");
        fx.lifecycle.on_item_enqueued();
        fx.lifecycle.on_item_enqueued();

        fx.lifecycle.begin_page_view();
        assert_eq!(log.throttle_count(), 0);
        assert_eq!(fx.lifecycle.ledger().lost_item_count(), 0);
        Ok(())
    }

    #[test]
    fn confirmed_batches_reduce_loss() -> Result<()> {
        let fx = fixture(5)?;
        for _ in 0..3 {
            fx.lifecycle.on_item_enqueued();
        }
        fx.lifecycle.on_batch_sent(3);
        assert_eq!(fx.lifecycle.check_loss(), LossReportOutcome::NoLoss);
        assert!(fx.reporter.reports().is_empty());
        Ok(())
    }

    #[test]
    fn unload_reports_then_drains_failures() -> Result<()> {
        let fx = fixture(5)?;
        fx.reporter.fail_flush(true);
        fx.lifecycle.on_item_enqueued();

        let summary = fx.lifecycle.unload();
        assert!(matches!(summary.loss, LossReportOutcome::Failed { .. }));
        assert_eq!(summary.drained.emitted, 1);

        let traces = fx.sink.traces();
        let first = traces.first();
        assert!(first.is_some_and(|trace| trace.text.contains("Failed to report lost")));
        assert!(first.is_some_and(|trace| trace.properties.is_some()));
        Ok(())
    }
}
