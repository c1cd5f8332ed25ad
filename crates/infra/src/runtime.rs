//! Composition root: wires a validated config to concrete adapters.

use crate::pump::{PumpIntervals, PumpReport, spawn_pump};
use insights_diag_adapters::{JsonLinesReporter, JsonTraceSink, LogSink, TracingConsole};
use insights_diag_app::{
    DiagnosticLog, DiagnosticMode, DrainBridge, LossLedger, LossLedgerDeps, PageLifecycle,
};
use insights_diag_config::ValidatedDiagnosticsConfig;
use insights_diag_ports::{ConsoleSinkPort, LossReporterPort, SessionStoragePort, TraceSinkPort};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Adapters plugged into the runtime.
#[derive(Clone)]
pub struct RuntimeAdapters {
    /// Console echo. `None` disables echoing.
    pub console: Option<Arc<dyn ConsoleSinkPort>>,
    /// Session storage. `None` disables the loss ledger.
    pub storage: Option<Arc<dyn SessionStoragePort>>,
    /// Loss reporter. `None` disables the loss ledger.
    pub reporter: Option<Arc<dyn LossReporterPort>>,
    /// Destination for drained diagnostics.
    pub trace: Arc<dyn TraceSinkPort>,
}

impl RuntimeAdapters {
    /// JSON-line reporter and trace sink sharing `output`, console routed to `tracing`.
    #[must_use]
    pub fn json_lines(
        output: Arc<dyn LogSink>,
        storage: Option<Arc<dyn SessionStoragePort>>,
    ) -> Self {
        Self {
            console: Some(Arc::new(TracingConsole)),
            storage,
            reporter: Some(Arc::new(JsonLinesReporter::new(Arc::clone(&output)))),
            trace: Arc::new(JsonTraceSink::new(output)),
        }
    }
}

impl fmt::Debug for RuntimeAdapters {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RuntimeAdapters")
            .field("console", &self.console.is_some())
            .field("storage", &self.storage.is_some())
            .field("reporter", &self.reporter.is_some())
            .finish_non_exhaustive()
    }
}

/// A fully wired diagnostics subsystem.
#[derive(Debug, Clone)]
pub struct DiagnosticsRuntime {
    lifecycle: PageLifecycle,
    intervals: PumpIntervals,
}

impl DiagnosticsRuntime {
    /// Build the log, ledger, drain bridge, and lifecycle from `config`.
    #[must_use]
    pub fn build(config: &ValidatedDiagnosticsConfig, adapters: RuntimeAdapters) -> Self {
        let limits = config.limits();
        let mode = DiagnosticMode {
            debug_exceptions: config.logging.debug_exceptions,
            verbose_logging: config.logging.verbose_logging,
        };

        let log = Arc::new(DiagnosticLog::new(
            mode,
            limits.throttle_limit,
            adapters.console,
        ));
        let ledger = Arc::new(LossLedger::new(
            LossLedgerDeps {
                storage: adapters.storage,
                reporter: adapters.reporter,
                log: Arc::clone(&log),
            },
            limits.report_limit,
        ));
        let drain = DrainBridge::new(Arc::clone(&log), adapters.trace);

        tracing::debug!(
            throttle_limit = limits.throttle_limit.get(),
            report_limit = limits.report_limit.get(),
            ledger_enabled = ledger.is_enabled(),
            "diagnostics runtime built"
        );
        Self {
            lifecycle: PageLifecycle::new(log, ledger, drain),
            intervals: PumpIntervals {
                drain: limits.drain_interval,
                loss_check: limits.loss_check_interval,
            },
        }
    }

    /// Page lifecycle entry points.
    #[must_use]
    pub const fn lifecycle(&self) -> &PageLifecycle {
        &self.lifecycle
    }

    /// Shared diagnostic log.
    #[must_use]
    pub const fn log(&self) -> &Arc<DiagnosticLog> {
        self.lifecycle.log()
    }

    /// Shared loss ledger.
    #[must_use]
    pub const fn ledger(&self) -> &Arc<LossLedger> {
        self.lifecycle.ledger()
    }

    /// Configured pump intervals.
    #[must_use]
    pub const fn intervals(&self) -> PumpIntervals {
        self.intervals
    }

    /// Start the background pump on the current tokio runtime.
    pub fn spawn_pump(&self, token: CancellationToken) -> JoinHandle<PumpReport> {
        spawn_pump(self.lifecycle.clone(), self.intervals, token)
    }
}
