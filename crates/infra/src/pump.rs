//! Background pump driving the drain and the loss check on timers.

use insights_diag_app::{LossReportOutcome, PageLifecycle, UnloadSummary};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Timer periods for the pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpIntervals {
    /// Period between drain passes.
    pub drain: Duration,
    /// Period between loss checks.
    pub loss_check: Duration,
}

/// Totals accumulated by one pump run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PumpReport {
    /// Timed drain passes.
    pub drain_passes: u64,
    /// Timed loss checks.
    pub loss_checks: u64,
    /// Loss reports emitted by timed checks.
    pub loss_reports: u64,
    /// Messages emitted by timed drains.
    pub emitted: usize,
    /// Messages the trace sink rejected during timed drains.
    pub failed: usize,
    /// Final pass run after cancellation.
    pub unload: UnloadSummary,
}

/// Spawn [`run_pump`] on the current tokio runtime.
pub fn spawn_pump(
    lifecycle: PageLifecycle,
    intervals: PumpIntervals,
    token: CancellationToken,
) -> JoinHandle<PumpReport> {
    tokio::spawn(run_pump(lifecycle, intervals, token))
}

/// Drain and check for loss on their own periods until `token` is cancelled,
/// then run the unload pass.
///
/// The first tick of each timer fires one full period after start.
pub async fn run_pump(
    lifecycle: PageLifecycle,
    intervals: PumpIntervals,
    token: CancellationToken,
) -> PumpReport {
    let mut drain_ticker = ticker(intervals.drain);
    let mut loss_ticker = ticker(intervals.loss_check);
    let mut drain_passes = 0_u64;
    let mut loss_checks = 0_u64;
    let mut loss_reports = 0_u64;
    let mut emitted = 0_usize;
    let mut failed = 0_usize;

    tracing::info!(
        drain_ms = duration_ms(intervals.drain),
        loss_check_ms = duration_ms(intervals.loss_check),
        "diagnostics pump started"
    );
    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => break,
            _ = drain_ticker.tick() => {
                let summary = lifecycle.drain();
                drain_passes += 1;
                emitted += summary.emitted;
                failed += summary.failed;
            },
            _ = loss_ticker.tick() => {
                loss_checks += 1;
                if let LossReportOutcome::Reported { .. } = lifecycle.check_loss() {
                    loss_reports += 1;
                }
            },
        }
    }

    let unload = lifecycle.unload();
    tracing::info!(drain_passes, loss_checks, emitted, "diagnostics pump stopped");
    PumpReport {
        drain_passes,
        loss_checks,
        loss_reports,
        emitted,
        failed,
        unload,
    }
}

fn ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use insights_diag_app::{DiagnosticLog, DrainBridge, LossLedger, LossLedgerDeps};
    use insights_diag_domain::{ReportLimit, Severity};
    use insights_diag_testkit::{RecordingReporter, RecordingTraceSink, ScriptedSessionStorage};
    use std::error::Error;
    use std::sync::Arc;

    fn lifecycle(sink: Arc<RecordingTraceSink>, reporter: Arc<RecordingReporter>) -> PageLifecycle {
        let log = Arc::new(DiagnosticLog::headless());
        let ledger = Arc::new(LossLedger::new(
            LossLedgerDeps {
                storage: Some(Arc::new(ScriptedSessionStorage::new())),
                reporter: Some(reporter),
                log: Arc::clone(&log),
            },
            ReportLimit::default(),
        ));
        let drain = DrainBridge::new(Arc::clone(&log), sink);
        PageLifecycle::new(log, ledger, drain)
    }

    const HOUR: Duration = Duration::from_secs(3_600);

    #[tokio::test]
    async fn cancellation_runs_the_unload_pass() -> Result<(), Box<dyn Error>> {
        let sink = Arc::new(RecordingTraceSink::new());
        let reporter = Arc::new(RecordingReporter::new());
        let lifecycle = lifecycle(sink.clone(), reporter.clone());
        let _ = lifecycle
            .log()
            .report_user_actionable(Severity::Critical, "pending");
        lifecycle.on_item_enqueued();

        let token = CancellationToken::new();
        let handle = spawn_pump(
            lifecycle,
            PumpIntervals {
                drain: HOUR,
                loss_check: HOUR,
            },
            token.clone(),
        );
        token.cancel();
        let report = handle.await?;

        assert_eq!(report.drain_passes, 0);
        assert_eq!(report.unload.loss, LossReportOutcome::Reported { lost: 1 });
        assert_eq!(report.unload.drained.emitted, 1);
        assert_eq!(sink.traces().len(), 1);
        assert_eq!(reporter.reports().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn timed_drains_run_before_cancellation() -> Result<(), Box<dyn Error>> {
        let sink = Arc::new(RecordingTraceSink::new());
        let lifecycle = lifecycle(sink.clone(), Arc::new(RecordingReporter::new()));
        let _ = lifecycle
            .log()
            .report_user_actionable(Severity::Critical, "early");

        let token = CancellationToken::new();
        let handle = spawn_pump(
            lifecycle,
            PumpIntervals {
                drain: Duration::from_millis(10),
                loss_check: HOUR,
            },
            token.clone(),
        );
        tokio::time::sleep(Duration::from_millis(200)).await;
        token.cancel();
        let report = handle.await?;

        assert!(report.drain_passes >= 1);
        assert_eq!(report.emitted, 1);
        assert_eq!(report.unload.drained.total(), 0);
        assert_eq!(sink.traces().len(), 1);
        Ok(())
    }
}
