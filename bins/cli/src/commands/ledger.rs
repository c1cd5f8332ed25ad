//! Ledger command handlers over a file-backed session.

use crate::commands::parse_event_lines;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, pretty_json, push_ndjson};
use crate::{CliOutput, format_fields_text, log_info};
use insights_diag_infra::{
    MemoryLogSink, ValidatedDiagnosticsConfig, run_ledger_confirm, run_ledger_enqueue,
    run_ledger_report, run_ledger_reset, run_ledger_status,
};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Ledger subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerAction {
    Status,
    Enqueue(u64),
    Confirm(u64),
    Report,
    Reset,
}

impl LedgerAction {
    const fn kind(self) -> &'static str {
        match self {
            Self::Status => "ledger.status",
            Self::Enqueue(_) => "ledger.enqueue",
            Self::Confirm(_) => "ledger.confirm",
            Self::Report => "ledger.report",
            Self::Reset => "ledger.reset",
        }
    }
}

/// Run a ledger subcommand against `session_path`.
pub fn run_ledger(
    mode: OutputMode,
    config: &ValidatedDiagnosticsConfig,
    session_path: &Path,
    action: LedgerAction,
) -> Result<CliOutput, CliError> {
    let events = Arc::new(MemoryLogSink::new());
    let mut stderr = String::new();
    log_info(
        &mut stderr,
        &format!("session file: {}", session_path.display()),
        mode.no_progress,
    );

    let result: Value = match action {
        LedgerAction::Status => serde_json::to_value(run_ledger_status(session_path, config)?)?,
        LedgerAction::Enqueue(count) => serde_json::to_value(run_ledger_enqueue(
            session_path,
            config,
            count,
            events.clone(),
        )?)?,
        LedgerAction::Confirm(count) => serde_json::to_value(run_ledger_confirm(
            session_path,
            config,
            count,
            events.clone(),
        )?)?,
        LedgerAction::Report => {
            serde_json::to_value(run_ledger_report(session_path, config, events.clone())?)?
        },
        LedgerAction::Reset => {
            run_ledger_reset(session_path)?;
            serde_json::json!({ "reset": true })
        },
    };
    let lines = events.take();

    let stdout = if mode.is_ndjson() {
        let mut out = String::new();
        for event in parse_event_lines(&lines)? {
            push_ndjson(&mut out, "event", event)?;
        }
        push_ndjson(
            &mut out,
            "summary",
            serde_json::json!({ "status": "ok", "kind": action.kind(), "result": result }),
        )?;
        out
    } else if mode.is_json() {
        pretty_json(&serde_json::json!({
            "status": "ok",
            "kind": action.kind(),
            "result": result,
            "events": parse_event_lines(&lines)?,
        }))?
    } else {
        let mut out = String::from("status: ok\n");
        out.push_str(&format_fields_text(&result));
        if !lines.is_empty() {
            out.push_str("events:\n");
            for line in &lines {
                out.push_str("  ");
                out.push_str(line);
            }
        }
        out
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}
