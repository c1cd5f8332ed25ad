//! Simulate command handler.

use crate::commands::parse_event_lines;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, pretty_json, push_ndjson};
use crate::{CliOutput, format_fields_text, log_info};
use insights_diag_infra::{MemoryLogSink, SimulateOptions, ValidatedDiagnosticsConfig, run_simulate};
use std::sync::Arc;
use std::time::Duration;

/// Parsed `simulate` flags.
#[derive(Debug, Clone, Copy)]
pub struct SimulateCommandInput {
    pub page_views: u32,
    pub critical: u32,
    pub warnings: u32,
    pub items: u64,
    pub confirmed: u64,
    pub pump_ms: Option<u64>,
}

/// Run a simulated session and print the drained events and the tallies.
pub fn run_simulate_command(
    mode: OutputMode,
    config: &ValidatedDiagnosticsConfig,
    input: SimulateCommandInput,
) -> Result<CliOutput, CliError> {
    let events = Arc::new(MemoryLogSink::new());
    let mut stderr = String::new();
    log_info(
        &mut stderr,
        &format!("simulating {} page view(s)", input.page_views),
        mode.no_progress,
    );

    let summary = run_simulate(
        config,
        SimulateOptions {
            page_views: input.page_views,
            critical_per_view: input.critical,
            warnings_per_view: input.warnings,
            items_per_view: input.items,
            confirmed_per_view: input.confirmed,
            pump_for: input.pump_ms.map(Duration::from_millis),
        },
        events.clone(),
    )?;
    let lines = events.take();
    let summary = serde_json::to_value(&summary)?;

    let stdout = if mode.is_ndjson() {
        let mut out = String::new();
        for event in parse_event_lines(&lines)? {
            push_ndjson(&mut out, "event", event)?;
        }
        push_ndjson(
            &mut out,
            "summary",
            serde_json::json!({ "status": "ok", "kind": "simulate", "summary": summary }),
        )?;
        out
    } else if mode.is_json() {
        pretty_json(&serde_json::json!({
            "status": "ok",
            "summary": summary,
            "events": parse_event_lines(&lines)?,
        }))?
    } else {
        let mut out = String::from("status: ok\n");
        out.push_str(&format_fields_text(&summary));
        out.push_str("events:\n");
        for line in &lines {
            out.push_str("  ");
            out.push_str(line);
        }
        out
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}
