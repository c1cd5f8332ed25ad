//! Local CLI orchestration helpers.

use crate::runtime::{DiagnosticsRuntime, RuntimeAdapters};
use crate::{InfraError, InfraResult, PumpReport};
use insights_diag_adapters::{FileSessionStorage, InMemorySessionStorage, LogSink};
use insights_diag_app::{Disposition, LossReportOutcome, RecordOutcome};
use insights_diag_config::ValidatedDiagnosticsConfig;
use insights_diag_domain::{LedgerKey, Severity, parse_counter};
use insights_diag_ports::SessionStoragePort;
use insights_diag_shared::{ErrorCode};
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Persisted ledger counters for one file-backed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStatus {
    /// Session file.
    pub session_path: PathBuf,
    /// Items enqueued but not yet confirmed sent.
    pub items_queued: u64,
    /// Loss reports emitted this session.
    pub issues_reported: u64,
    /// Configured per-session report limit.
    pub report_limit: u32,
}

/// Outcome of `ledger report`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReportResult {
    /// `reported`, `noLoss`, `limitReached`, `disabled`, or `failed`.
    pub outcome: &'static str,
    /// Items reported lost, when a report was emitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lost: Option<u64>,
    /// Error code, when the report failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Diagnostics drained after the check.
    pub diagnostics_drained: usize,
    /// Counters after the check.
    pub status: LedgerStatus,
}

/// Read the persisted counters without modifying them.
pub fn run_ledger_status(
    session_path: &Path,
    config: &ValidatedDiagnosticsConfig,
) -> InfraResult<LedgerStatus> {
    let storage = FileSessionStorage::new(session_path);
    read_status(&storage, config)
}

/// Count `count` items as enqueued.
pub fn run_ledger_enqueue(
    session_path: &Path,
    config: &ValidatedDiagnosticsConfig,
    count: u64,
    output: Arc<dyn LogSink>,
) -> InfraResult<LedgerStatus> {
    let (storage, runtime) = file_runtime(session_path, config, output)?;
    for _ in 0..count {
        runtime.lifecycle().on_item_enqueued();
    }
    read_status(&storage, config)
}

/// Confirm `count` items as sent.
pub fn run_ledger_confirm(
    session_path: &Path,
    config: &ValidatedDiagnosticsConfig,
    count: u64,
    output: Arc<dyn LogSink>,
) -> InfraResult<LedgerStatus> {
    let (storage, runtime) = file_runtime(session_path, config, output)?;
    runtime.lifecycle().on_batch_sent(count);
    read_status(&storage, config)
}

/// Run one loss check, then drain whatever it logged. Reports and drained
/// diagnostics are written to `output` as JSON lines.
pub fn run_ledger_report(
    session_path: &Path,
    config: &ValidatedDiagnosticsConfig,
    output: Arc<dyn LogSink>,
) -> InfraResult<LedgerReportResult> {
    let (storage, runtime) = file_runtime(session_path, config, output)?;
    let summary = runtime.lifecycle().unload();

    let (outcome, lost, error_code) = match &summary.loss {
        LossReportOutcome::Disabled => ("disabled", None, None),
        LossReportOutcome::LimitReached { .. } => ("limitReached", None, None),
        LossReportOutcome::NoLoss => ("noLoss", None, None),
        LossReportOutcome::Reported { lost } => ("reported", Some(*lost), None),
        LossReportOutcome::Failed { error } => ("failed", None, Some(error.code.to_string())),
    };
    Ok(LedgerReportResult {
        outcome,
        lost,
        error_code,
        diagnostics_drained: summary.drained.emitted,
        status: read_status(&storage, config)?,
    })
}

/// End the session by deleting its file.
pub fn run_ledger_reset(session_path: &Path) -> InfraResult<()> {
    FileSessionStorage::new(session_path).clear()
}

fn file_runtime(
    session_path: &Path,
    config: &ValidatedDiagnosticsConfig,
    output: Arc<dyn LogSink>,
) -> InfraResult<(Arc<FileSessionStorage>, DiagnosticsRuntime)> {
    let storage = Arc::new(FileSessionStorage::new(session_path));
    // The ledger swallows storage errors; surface a corrupt file up front.
    let _ = storage.load()?;
    let runtime = DiagnosticsRuntime::build(
        config,
        RuntimeAdapters::json_lines(output, Some(storage.clone())),
    );
    Ok((storage, runtime))
}

fn read_status(
    storage: &FileSessionStorage,
    config: &ValidatedDiagnosticsConfig,
) -> InfraResult<LedgerStatus> {
    let read = |key: LedgerKey| -> InfraResult<u64> {
        Ok(parse_counter(storage.get(key.as_str())?.as_deref()))
    };
    Ok(LedgerStatus {
        session_path: storage.path().to_path_buf(),
        items_queued: read(LedgerKey::ItemsQueued)?,
        issues_reported: read(LedgerKey::IssuesReported)?,
        report_limit: config.limits().report_limit.get(),
    })
}

/// Inputs for a simulated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulateOptions {
    /// Page views to simulate.
    pub page_views: u32,
    /// Critical diagnostics recorded per page view.
    pub critical_per_view: u32,
    /// Warning diagnostics recorded per page view.
    pub warnings_per_view: u32,
    /// Telemetry items enqueued per page view.
    pub items_per_view: u64,
    /// Telemetry items confirmed sent per page view.
    pub confirmed_per_view: u64,
    /// Run the timed pump for this long after the last page view instead of
    /// a single unload pass.
    pub pump_for: Option<Duration>,
}

impl Default for SimulateOptions {
    fn default() -> Self {
        Self {
            page_views: 1,
            critical_per_view: 3,
            warnings_per_view: 0,
            items_per_view: 0,
            confirmed_per_view: 0,
            pump_for: None,
        }
    }
}

/// Tallies from a simulated session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateSummary {
    /// Page views simulated.
    pub page_views: u32,
    /// Messages queued.
    pub queued: u64,
    /// Throttle sentinels appended.
    pub sentinels: u64,
    /// Messages filtered out by verbosity.
    pub filtered: u64,
    /// Messages dropped by the throttle.
    pub dropped: u64,
    /// Messages raised in debug mode.
    pub raised: u64,
    /// Drained messages accepted by the trace sink.
    pub drained: u64,
    /// Drained messages the trace sink rejected.
    pub drain_failures: u64,
    /// Loss reports emitted.
    pub loss_reports: u64,
}

impl SimulateSummary {
    fn tally(&mut self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Raise(_) => self.raised += 1,
            RecordOutcome::Recorded(Disposition::Queued) => self.queued += 1,
            RecordOutcome::Recorded(Disposition::QueuedWithSentinel) => {
                self.queued += 1;
                self.sentinels += 1;
            },
            RecordOutcome::Recorded(Disposition::FilteredByVerbosity) => self.filtered += 1,
            RecordOutcome::Recorded(Disposition::DroppedByThrottle) => self.dropped += 1,
        }
    }

    fn add_drain(&mut self, emitted: usize, failed: usize) {
        self.drained += u64::try_from(emitted).unwrap_or(u64::MAX);
        self.drain_failures += u64::try_from(failed).unwrap_or(u64::MAX);
    }
}

/// Simulate a session against in-memory storage. Drained diagnostics and
/// loss reports are written to `output` as JSON lines.
pub fn run_simulate(
    config: &ValidatedDiagnosticsConfig,
    options: SimulateOptions,
    output: Arc<dyn LogSink>,
) -> InfraResult<SimulateSummary> {
    let storage: Arc<dyn SessionStoragePort> = Arc::new(InMemorySessionStorage::new());
    let runtime = DiagnosticsRuntime::build(config, RuntimeAdapters::json_lines(output, Some(storage)));
    let lifecycle = runtime.lifecycle();
    let log = runtime.log();
    let mut summary = SimulateSummary {
        page_views: options.page_views,
        ..SimulateSummary::default()
    };

    for view in 0..options.page_views {
        lifecycle.begin_page_view();
        for index in 0..options.critical_per_view {
            let outcome = log.report_user_actionable(
                Severity::Critical,
                format!("simulated critical failure {view}.{index}"),
            );
            summary.tally(&outcome);
        }
        for index in 0..options.warnings_per_view {
            let outcome = log.report_non_user_actionable(
                Severity::Warning,
                format!("simulated warning {view}.{index}"),
            );
            summary.tally(&outcome);
        }
        for _ in 0..options.items_per_view {
            lifecycle.on_item_enqueued();
        }
        lifecycle.on_batch_sent(options.confirmed_per_view);

        let drained = lifecycle.drain();
        summary.add_drain(drained.emitted, drained.failed);
        if lifecycle.check_loss().is_reported() {
            summary.loss_reports += 1;
        }
    }

    if let Some(duration) = options.pump_for {
        let report = run_pump_for(&runtime, duration)?;
        summary.add_drain(report.emitted, report.failed);
        summary.add_drain(report.unload.drained.emitted, report.unload.drained.failed);
        summary.loss_reports += report.loss_reports;
        if report.unload.loss.is_reported() {
            summary.loss_reports += 1;
        }
    } else {
        let unload = lifecycle.unload();
        summary.add_drain(unload.drained.emitted, unload.drained.failed);
        if unload.loss.is_reported() {
            summary.loss_reports += 1;
        }
    }

    tracing::debug!(?summary, "simulation complete");
    Ok(summary)
}

/// Run the background pump on a dedicated current-thread runtime for
/// `duration`, then cancel it and return its report.
pub fn run_pump_for(runtime: &DiagnosticsRuntime, duration: Duration) -> InfraResult<PumpReport> {
    let token = CancellationToken::new();
    block_on(async {
        let handle = runtime.spawn_pump(token.clone());
        tokio::time::sleep(duration).await;
        token.cancel();
        handle.await.map_err(|error| {
            InfraError::unexpected(
                ErrorCode::internal(),
                format!("diagnostics pump failed: {error}"),
            )
        })
    })
}

fn block_on<F, T>(future: F) -> InfraResult<T>
where
    F: Future<Output = InfraResult<T>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(InfraError::from)?;
    runtime.block_on(future)
}
