//! Session-scoped telemetry loss ledger.
//!
//! Two persisted counters track items handed to the outbound pipeline but not
//! yet confirmed sent, and how many loss reports this session has emitted. The
//! ledger is fail-open: storage failures are observed and discarded, and
//! failures while reporting are funneled into the diagnostic log.

use crate::diagnostic_log::DiagnosticLog;
use insights_diag_domain::{
    DiagnosticMessage, LedgerKey, MessageProperties, ReportLimit, Severity, format_counter,
    loss_report_text, parse_counter,
};
use insights_diag_ports::{LossReporterPort, SessionStoragePort};
use insights_diag_shared::{ErrorEnvelope, Result, ResultExt};
use std::fmt;
use std::sync::Arc;

/// Text of the diagnostic recorded when a loss check fails.
pub const LOSS_REPORT_FAILURE_TEXT: &str = "Failed to report lost telemetry items";

/// Dependencies required by the loss ledger.
#[derive(Clone)]
pub struct LossLedgerDeps {
    /// Session-scoped storage. `None` disables the ledger.
    pub storage: Option<Arc<dyn SessionStoragePort>>,
    /// Loss reporter. `None` disables the ledger.
    pub reporter: Option<Arc<dyn LossReporterPort>>,
    /// Diagnostic log receiving report failures.
    pub log: Arc<DiagnosticLog>,
}

/// Result of [`LossLedger::report_lost_items_if_any`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LossReportOutcome {
    /// No reporter or no usable storage.
    Disabled,
    /// The session already emitted `reported` reports, at or above the limit.
    LimitReached {
        /// Persisted report count.
        reported: u64,
    },
    /// Nothing was lost since the last check.
    NoLoss,
    /// A report for `lost` items was emitted and flushed.
    Reported {
        /// Lost item count stated in the report.
        lost: u64,
    },
    /// The check failed; the failure was recorded in the diagnostic log.
    Failed {
        /// What went wrong.
        error: ErrorEnvelope,
    },
}

impl LossReportOutcome {
    /// Returns true when a report was emitted and flushed.
    #[must_use]
    pub const fn is_reported(&self) -> bool {
        matches!(self, Self::Reported { .. })
    }
}

/// Persisted loss accounting for one session.
pub struct LossLedger {
    storage: Option<Arc<dyn SessionStoragePort>>,
    reporter: Option<Arc<dyn LossReporterPort>>,
    report_limit: ReportLimit,
    log: Arc<DiagnosticLog>,
}

impl fmt::Debug for LossLedger {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("LossLedger")
            .field("storage", &self.storage.is_some())
            .field("reporter", &self.reporter.is_some())
            .field("report_limit", &self.report_limit)
            .finish_non_exhaustive()
    }
}

impl LossLedger {
    /// Build a ledger from its collaborators.
    #[must_use]
    pub fn new(deps: LossLedgerDeps, report_limit: ReportLimit) -> Self {
        Self {
            storage: deps.storage,
            reporter: deps.reporter,
            report_limit,
            log: deps.log,
        }
    }

    /// Per-session report limit.
    #[must_use]
    pub const fn report_limit(&self) -> ReportLimit {
        self.report_limit
    }

    /// True when a reporter is registered and storage is present and usable.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled().is_some()
    }

    fn enabled(&self) -> Option<(&dyn SessionStoragePort, &dyn LossReporterPort)> {
        let storage = self.storage.as_deref()?;
        let reporter = self.reporter.as_deref()?;
        storage.is_available().then_some((storage, reporter))
    }

    /// Set `itemsQueued` to 0. Called once per page view.
    pub fn reset_queue_count(&self) {
        if let Some((storage, _)) = self.enabled() {
            write_counter(storage, LedgerKey::ItemsQueued, 0)
                .discard_err(|error| discarded(LedgerKey::ItemsQueued, &error));
        }
    }

    /// Loss reports already emitted this session.
    #[must_use]
    pub fn issues_reported_this_session(&self) -> u64 {
        self.read_or_zero(LedgerKey::IssuesReported)
    }

    /// Current estimate of items enqueued but not confirmed sent.
    #[must_use]
    pub fn lost_item_count(&self) -> u64 {
        self.read_or_zero(LedgerKey::ItemsQueued)
    }

    /// Count one item accepted into the outbound pipeline.
    pub fn increment_queued(&self) {
        self.update_queued(|current| current.saturating_add(1));
    }

    /// Subtract `confirmed` successfully sent items, clamping at 0.
    pub fn decrement_queued(&self, confirmed: u64) {
        self.update_queued(|current| current.saturating_sub(confirmed));
    }

    fn update_queued(&self, update: impl FnOnce(u64) -> u64) {
        let Some((storage, _)) = self.enabled() else {
            return;
        };
        read_counter(storage, LedgerKey::ItemsQueued)
            .and_then(|current| write_counter(storage, LedgerKey::ItemsQueued, update(current)))
            .discard_err(|error| discarded(LedgerKey::ItemsQueued, &error));
    }

    fn read_or_zero(&self, key: LedgerKey) -> u64 {
        let Some((storage, _)) = self.enabled() else {
            return 0;
        };
        read_counter(storage, key).unwrap_or_observe(0, |error| discarded(key, &error))
    }

    /// Periodic check: emit one loss report when items went missing.
    ///
    /// `itemsQueued` is reset to 0 on every enabled path, including failures.
    /// A report whose emission fails still counts against the session limit.
    pub fn report_lost_items_if_any(&self) -> LossReportOutcome {
        let Some((storage, reporter)) = self.enabled() else {
            return LossReportOutcome::Disabled;
        };

        let outcome = match self.check_and_report(storage, reporter) {
            Ok(outcome) => outcome,
            Err(error) => {
                self.record_failure(&error);
                LossReportOutcome::Failed { error }
            },
        };

        write_counter(storage, LedgerKey::ItemsQueued, 0)
            .discard_err(|error| discarded(LedgerKey::ItemsQueued, &error));
        outcome
    }

    fn check_and_report(
        &self,
        storage: &dyn SessionStoragePort,
        reporter: &dyn LossReporterPort,
    ) -> Result<LossReportOutcome> {
        let reported = read_counter(storage, LedgerKey::IssuesReported)?;
        if !self.report_limit.allows(reported) {
            return Ok(LossReportOutcome::LimitReached { reported });
        }

        let lost = read_counter(storage, LedgerKey::ItemsQueued)?;
        if lost == 0 {
            return Ok(LossReportOutcome::NoLoss);
        }

        let emitted = reporter
            .report(&loss_report_text(lost))
            .and_then(|()| reporter.flush());
        let reported = reported.saturating_add(1);
        let persisted = write_counter(storage, LedgerKey::IssuesReported, reported);
        match (emitted, persisted) {
            (Err(error), Err(write_error)) => {
                return Err(error.with_metadata("storageError", write_error.to_string()));
            },
            (Err(error), Ok(())) | (Ok(()), Err(error)) => return Err(error),
            (Ok(()), Ok(())) => {},
        }

        tracing::debug!(lost, reported, "loss report emitted");
        Ok(LossReportOutcome::Reported { lost })
    }

    fn record_failure(&self, error: &ErrorEnvelope) {
        let message =
            DiagnosticMessage::with_properties(LOSS_REPORT_FAILURE_TEXT, failure_properties(error));
        let outcome = self
            .log
            .report_non_user_actionable(Severity::Critical, message);
        if outcome.is_raise() {
            tracing::debug!(error = %error, "loss report failure raised in debug mode; not propagated");
        }
    }
}

fn failure_properties(error: &ErrorEnvelope) -> MessageProperties {
    let mut properties = MessageProperties::new();
    properties.insert("exception".to_string(), error.message.clone());
    properties.insert("code".to_string(), error.code.to_string());
    properties
}

fn read_counter(storage: &dyn SessionStoragePort, key: LedgerKey) -> Result<u64> {
    storage
        .get(key.as_str())
        .map(|raw| parse_counter(raw.as_deref()))
}

fn write_counter(storage: &dyn SessionStoragePort, key: LedgerKey, value: u64) -> Result<()> {
    storage.set(key.as_str(), &format_counter(value))
}

fn discarded(key: LedgerKey, error: &ErrorEnvelope) {
    tracing::debug!(%key, code = %error.code, error = %error, "session storage failure discarded");
}
