//! CLI E2E tests for `aidiag simulate`.

use serde_json::Value;
use std::io;
use std::process::Command;

fn run_simulate(args: &[&str], env: &[(&str, &str)]) -> io::Result<Value> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_aidiag"));
    command
        .args(["simulate", "--output", "json", "--no-progress"])
        .args(args);
    for (key, value) in env {
        command.env(key, value);
    }
    let output = command.output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(io::Error::other(format!("simulate failed: {stderr}")));
    }
    serde_json::from_slice(&output.stdout).map_err(io::Error::other)
}

fn summary_field(value: &Value, key: &str) -> Option<u64> {
    value.pointer(&format!("/summary/{key}")).and_then(Value::as_u64)
}

fn trace_messages(value: &Value) -> Vec<String> {
    value
        .get("events")
        .and_then(Value::as_array)
        .map(|events| {
            events
                .iter()
                .filter(|event| {
                    event.get("event").and_then(Value::as_str) == Some("diagnostics.trace")
                })
                .filter_map(|event| event.get("message").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn throttle_limit_queues_a_single_sentinel() -> io::Result<()> {
    let value = run_simulate(&["--critical", "5"], &[("AIDIAG_THROTTLE_LIMIT", "2")])?;

    assert_eq!(summary_field(&value, "queued"), Some(2));
    assert_eq!(summary_field(&value, "sentinels"), Some(1));
    assert_eq!(summary_field(&value, "dropped"), Some(3));
    assert_eq!(summary_field(&value, "drained"), Some(3));

    let messages = trace_messages(&value);
    assert_eq!(messages.len(), 3);
    assert!(messages.first().is_some_and(|text| text.starts_with("AI: ")));
    assert!(
        messages
            .last()
            .is_some_and(|text| text.contains("throttle limit per PageView reached"))
    );
    Ok(())
}

#[test]
fn throttle_resets_between_page_views() -> io::Result<()> {
    let value = run_simulate(
        &["--page-views", "2", "--critical", "3"],
        &[("AIDIAG_THROTTLE_LIMIT", "2")],
    )?;

    assert_eq!(summary_field(&value, "pageViews"), Some(2));
    assert_eq!(summary_field(&value, "queued"), Some(4));
    assert_eq!(summary_field(&value, "sentinels"), Some(2));
    assert_eq!(summary_field(&value, "dropped"), Some(2));
    Ok(())
}

#[test]
fn warnings_need_verbose_logging() -> io::Result<()> {
    let quiet = run_simulate(&["--critical", "0", "--warnings", "2"], &[])?;
    assert_eq!(summary_field(&quiet, "filtered"), Some(2));
    assert!(trace_messages(&quiet).is_empty());

    let verbose = run_simulate(
        &["--critical", "0", "--warnings", "2"],
        &[("AIDIAG_VERBOSE_LOGGING", "true")],
    )?;
    assert_eq!(summary_field(&verbose, "queued"), Some(2));
    assert!(
        trace_messages(&verbose)
            .iter()
            .all(|text| text.starts_with("AI (Internal): "))
    );
    Ok(())
}

#[test]
fn debug_exceptions_raise_instead_of_queueing() -> io::Result<()> {
    let value = run_simulate(
        &["--critical", "2"],
        &[("AIDIAG_DEBUG_EXCEPTIONS", "true")],
    )?;

    assert_eq!(summary_field(&value, "raised"), Some(2));
    assert_eq!(summary_field(&value, "queued"), Some(0));
    assert!(trace_messages(&value).is_empty());
    Ok(())
}

#[test]
fn unconfirmed_items_produce_a_loss_report() -> io::Result<()> {
    let value = run_simulate(
        &["--critical", "0", "--items", "4", "--confirmed", "1"],
        &[],
    )?;

    assert_eq!(summary_field(&value, "lossReports"), Some(1));
    let reports: Vec<&Value> = value
        .get("events")
        .and_then(Value::as_array)
        .map(|events| {
            events
                .iter()
                .filter(|event| {
                    event.get("event").and_then(Value::as_str) == Some("telemetry.loss_report")
                })
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(reports.len(), 1);
    assert!(
        reports
            .first()
            .and_then(|event| event.get("message"))
            .and_then(Value::as_str)
            .is_some_and(|text| text.contains("3 telemetry item(s)"))
    );
    Ok(())
}

#[test]
fn pump_mode_still_drains_on_unload() -> io::Result<()> {
    let value = run_simulate(&["--critical", "2", "--pump-ms", "20"], &[])?;

    assert_eq!(summary_field(&value, "drained"), Some(2));
    assert_eq!(summary_field(&value, "drainFailures"), Some(0));
    Ok(())
}

#[test]
fn ndjson_ends_with_a_summary_line() -> io::Result<()> {
    let output = Command::new(env!("CARGO_BIN_EXE_aidiag"))
        .args(["simulate", "--critical", "1", "--output", "ndjson", "--no-progress"])
        .output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<Value> = stdout
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()
        .map_err(io::Error::other)?;
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines.first().and_then(|line| line.get("type")).and_then(Value::as_str),
        Some("event")
    );
    assert_eq!(
        lines.last().and_then(|line| line.get("type")).and_then(Value::as_str),
        Some("summary")
    );
    Ok(())
}
