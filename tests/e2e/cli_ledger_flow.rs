//! CLI E2E tests for the file-backed loss ledger.

use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_session(label: &str) -> io::Result<PathBuf> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(io::Error::other)?
        .as_nanos();
    Ok(std::env::temp_dir().join(format!("aidiag-e2e-{label}-{nanos}.json")))
}

fn ledger(session: &Path, args: &[&str], env: &[(&str, &str)]) -> io::Result<Output> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_aidiag"));
    command
        .arg("ledger")
        .arg("--session")
        .arg(session)
        .args(["--output", "json", "--no-progress"])
        .args(args);
    for (key, value) in env {
        command.env(key, value);
    }
    command.output()
}

fn ledger_ok(session: &Path, args: &[&str], env: &[(&str, &str)]) -> io::Result<Value> {
    let output = ledger(session, args, env)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        return Err(io::Error::other(format!(
            "ledger {args:?} failed: {stdout}{stderr}"
        )));
    }
    serde_json::from_slice(&output.stdout).map_err(io::Error::other)
}

fn result_u64(value: &Value, pointer: &str) -> Option<u64> {
    value.pointer(&format!("/result{pointer}")).and_then(Value::as_u64)
}

fn result_str<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(&format!("/result{pointer}")).and_then(Value::as_str)
}

#[test]
fn counters_persist_across_invocations() -> io::Result<()> {
    let session = temp_session("persist")?;

    let status = ledger_ok(&session, &["status"], &[])?;
    assert_eq!(result_u64(&status, "/itemsQueued"), Some(0));

    ledger_ok(&session, &["enqueue", "--count", "5"], &[])?;
    let confirmed = ledger_ok(&session, &["confirm", "--count", "2"], &[])?;
    assert_eq!(result_u64(&confirmed, "/itemsQueued"), Some(3));

    let report = ledger_ok(&session, &["report"], &[])?;
    assert_eq!(result_str(&report, "/outcome"), Some("reported"));
    assert_eq!(result_u64(&report, "/lost"), Some(3));
    assert_eq!(result_u64(&report, "/status/itemsQueued"), Some(0));
    assert_eq!(result_u64(&report, "/status/issuesReported"), Some(1));

    let events = report
        .get("events")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    assert!(events.iter().any(|event| {
        event.get("event").and_then(Value::as_str) == Some("telemetry.loss_report")
    }));

    let clean = ledger_ok(&session, &["report"], &[])?;
    assert_eq!(result_str(&clean, "/outcome"), Some("noLoss"));

    ledger_ok(&session, &["reset"], &[])?;
    assert!(!session.exists());
    Ok(())
}

#[test]
fn report_limit_stops_further_reports() -> io::Result<()> {
    let session = temp_session("limit")?;
    let env = [("AIDIAG_REPORT_LIMIT", "1")];

    ledger_ok(&session, &["enqueue", "--count", "2"], &env)?;
    let first = ledger_ok(&session, &["report"], &env)?;
    assert_eq!(result_str(&first, "/outcome"), Some("reported"));

    ledger_ok(&session, &["enqueue"], &env)?;
    let second = ledger_ok(&session, &["report"], &env)?;
    assert_eq!(result_str(&second, "/outcome"), Some("limitReached"));
    assert_eq!(result_u64(&second, "/status/issuesReported"), Some(1));

    ledger_ok(&session, &["reset"], &env)?;
    Ok(())
}

#[test]
fn corrupt_session_file_exits_with_io_code() -> io::Result<()> {
    let session = temp_session("corrupt")?;
    std::fs::write(&session, "not json")?;

    let output = ledger(&session, &["enqueue"], &[])?;
    assert_eq!(output.status.code(), Some(3));

    let value: Value = serde_json::from_slice(&output.stdout).map_err(io::Error::other)?;
    assert_eq!(
        value.pointer("/error/code").and_then(Value::as_str),
        Some("storage:corrupt")
    );

    std::fs::remove_file(&session)?;
    Ok(())
}

#[test]
fn text_output_lists_counters() -> io::Result<()> {
    let session = temp_session("text")?;
    let output = Command::new(env!("CARGO_BIN_EXE_aidiag"))
        .arg("ledger")
        .arg("--session")
        .arg(&session)
        .args(["enqueue", "--count", "2", "--no-progress"])
        .output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("status: ok\n"));
    assert!(stdout.contains("itemsQueued: 2\n"));

    std::fs::remove_file(&session)?;
    Ok(())
}
