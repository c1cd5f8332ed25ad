//! End-to-end flows through the log, ledger, drain, and lifecycle.

use insights_diag_app::{
    DiagnosticLog, DiagnosticMode, DrainBridge, LossLedger, LossLedgerDeps, LossReportOutcome,
    PageLifecycle,
};
use insights_diag_domain::{
    LedgerKey, ReportLimit, Severity, THROTTLE_SENTINEL_TEXT, ThrottleLimit,
};
use insights_diag_ports::ConsoleChannel;
use insights_diag_shared::{ErrorEnvelope, Result};
use insights_diag_testkit::{
    RecordingConsole, RecordingReporter, RecordingTraceSink, ScriptedSessionStorage,
};
use proptest::prelude::*;
use std::sync::Arc;

struct Harness {
    console: Arc<RecordingConsole>,
    storage: Arc<ScriptedSessionStorage>,
    reporter: Arc<RecordingReporter>,
    sink: Arc<RecordingTraceSink>,
    lifecycle: PageLifecycle,
}

fn harness(mode: DiagnosticMode, throttle: u32, report_limit: u32) -> Result<Harness> {
    let console = Arc::new(RecordingConsole::full());
    let log = Arc::new(DiagnosticLog::new(
        mode,
        ThrottleLimit::new(throttle).map_err(ErrorEnvelope::from)?,
        Some(console.clone()),
    ));
    let storage = Arc::new(ScriptedSessionStorage::new());
    let reporter = Arc::new(RecordingReporter::new());
    let sink = Arc::new(RecordingTraceSink::new());
    let ledger = Arc::new(LossLedger::new(
        LossLedgerDeps {
            storage: Some(storage.clone()),
            reporter: Some(reporter.clone()),
            log: Arc::clone(&log),
        },
        ReportLimit::new(report_limit).map_err(ErrorEnvelope::from)?,
    ));
    let drain = DrainBridge::new(Arc::clone(&log), sink.clone());
    Ok(Harness {
        console,
        storage,
        reporter,
        sink,
        lifecycle: PageLifecycle::new(log, ledger, drain),
    })
}

#[test]
fn throttled_page_view_drains_with_sentinel_last() -> Result<()> {
    let h = harness(DiagnosticMode::production(), 2, 10)?;
    let log = h.lifecycle.log();
    for index in 0..4 {
        let _ = log.report_user_actionable(Severity::Critical, format!("failure {index}"));
    }

    let summary = h.lifecycle.drain();
    assert_eq!(summary.emitted, 3);
    let texts: Vec<String> = h.sink.traces().into_iter().map(|trace| trace.text).collect();
    assert_eq!(texts.last().map(String::as_str), Some(THROTTLE_SENTINEL_TEXT));

    h.lifecycle.begin_page_view();
    let _ = log.report_user_actionable(Severity::Critical, "fresh view");
    assert_eq!(log.queue_len(), 1);
    Ok(())
}

#[test]
fn warnings_are_only_queued_when_verbose() -> Result<()> {
    let quiet = harness(DiagnosticMode::production(), 5, 10)?;
    let _ = quiet
        .lifecycle
        .log()
        .report_user_actionable(Severity::Warning, "soft");
    assert_eq!(quiet.lifecycle.drain().total(), 0);

    let verbose = harness(
        DiagnosticMode {
            debug_exceptions: false,
            verbose_logging: true,
        },
        5,
        10,
    )?;
    let _ = verbose
        .lifecycle
        .log()
        .report_user_actionable(Severity::Warning, "soft");
    assert_eq!(verbose.lifecycle.drain().emitted, 1);
    assert!(
        verbose
            .console
            .lines()
            .iter()
            .any(|(channel, line)| *channel == ConsoleChannel::Warn && line.contains("soft"))
    );
    Ok(())
}

#[test]
fn debug_mode_raises_instead_of_queueing() -> Result<()> {
    let h = harness(
        DiagnosticMode {
            debug_exceptions: true,
            verbose_logging: false,
        },
        5,
        10,
    )?;
    let outcome = h
        .lifecycle
        .log()
        .report_user_actionable(Severity::Critical, "explode");
    let error = outcome
        .into_result()
        .err()
        .ok_or_else(|| std::io::Error::other("expected raised diagnostic"))?;
    assert_eq!(error.message, "explode");
    assert_eq!(h.lifecycle.log().queue_len(), 0);
    Ok(())
}

#[test]
fn unconfirmed_items_are_reported_once_per_check_up_to_limit() -> Result<()> {
    let h = harness(DiagnosticMode::production(), 5, 2)?;

    for _ in 0..3 {
        for _ in 0..4 {
            h.lifecycle.on_item_enqueued();
        }
        h.lifecycle.on_batch_sent(1);
        let _ = h.lifecycle.unload();
    }

    let reports = h.reporter.reports();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|text| text.contains("3 telemetry item(s)")));
    assert_eq!(
        h.storage.raw(LedgerKey::IssuesReported.as_str()).as_deref(),
        Some("2")
    );
    assert_eq!(
        h.storage.raw(LedgerKey::ItemsQueued.as_str()).as_deref(),
        Some("0")
    );
    Ok(())
}

#[test]
fn persisted_counters_survive_a_new_ledger_instance() -> Result<()> {
    let h = harness(DiagnosticMode::production(), 5, 10)?;
    h.lifecycle.on_item_enqueued();
    h.lifecycle.on_item_enqueued();

    let reloaded = LossLedger::new(
        LossLedgerDeps {
            storage: Some(h.storage.clone()),
            reporter: Some(h.reporter.clone()),
            log: Arc::new(DiagnosticLog::headless()),
        },
        ReportLimit::default(),
    );
    assert_eq!(reloaded.lost_item_count(), 2);
    assert_eq!(
        reloaded.report_lost_items_if_any(),
        LossReportOutcome::Reported { lost: 2 }
    );
    Ok(())
}

#[test]
fn unavailable_storage_disables_the_ledger_silently() -> Result<()> {
    let log = Arc::new(DiagnosticLog::headless());
    let reporter = Arc::new(RecordingReporter::new());
    let ledger = LossLedger::new(
        LossLedgerDeps {
            storage: Some(Arc::new(ScriptedSessionStorage::unavailable())),
            reporter: Some(reporter.clone()),
            log: Arc::clone(&log),
        },
        ReportLimit::default(),
    );

    ledger.increment_queued();
    assert_eq!(ledger.report_lost_items_if_any(), LossReportOutcome::Disabled);
    assert!(reporter.reports().is_empty());
    assert_eq!(log.queue_len(), 0);
    Ok(())
}

proptest! {
    #[test]
    fn queued_count_clamps_at_zero(
        increments in 0u64..40,
        decrements in proptest::collection::vec(0u64..10, 0..10),
    ) {
        let ledger = LossLedger::new(
            LossLedgerDeps {
                storage: Some(Arc::new(ScriptedSessionStorage::new())),
                reporter: Some(Arc::new(RecordingReporter::new())),
                log: Arc::new(DiagnosticLog::headless()),
            },
            ReportLimit::default(),
        );

        let mut expected = 0u64;
        for _ in 0..increments {
            ledger.increment_queued();
            expected += 1;
        }
        for confirmed in decrements {
            ledger.decrement_queued(confirmed);
            expected = expected.saturating_sub(confirmed);
        }
        prop_assert_eq!(ledger.lost_item_count(), expected);
    }
}
