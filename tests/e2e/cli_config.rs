//! CLI E2E tests for config loading and the `config` and `info` commands.

use serde_json::Value;
use std::io;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_config(label: &str, extension: &str, contents: &str) -> io::Result<PathBuf> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(io::Error::other)?
        .as_nanos();
    let path = std::env::temp_dir().join(format!("aidiag-e2e-{label}-{nanos}.{extension}"));
    std::fs::write(&path, contents)?;
    Ok(path)
}

fn aidiag() -> Command {
    Command::new(env!("CARGO_BIN_EXE_aidiag"))
}

#[test]
fn config_show_is_deterministic() -> io::Result<()> {
    let first = aidiag().args(["config", "show"]).output()?;
    let second = aidiag().args(["config", "show"]).output()?;

    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);

    let value: Value = serde_json::from_slice(&first.stdout).map_err(io::Error::other)?;
    assert_eq!(
        value.pointer("/logging/throttleLimit").and_then(Value::as_u64),
        Some(25)
    );
    assert_eq!(
        value.pointer("/loss/reportLimit").and_then(Value::as_u64),
        Some(10)
    );
    Ok(())
}

#[test]
fn env_overrides_the_config_file() -> io::Result<()> {
    let path = temp_config(
        "precedence",
        "toml",
        "[logging]\nthrottleLimit = 40\nverboseLogging = true\n",
    )?;

    let output = aidiag()
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .env("AIDIAG_THROTTLE_LIMIT", "7")
        .output()?;
    std::fs::remove_file(&path)?;
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).map_err(io::Error::other)?;
    assert_eq!(
        value.pointer("/logging/throttleLimit").and_then(Value::as_u64),
        Some(7)
    );
    assert_eq!(
        value.pointer("/logging/verboseLogging").and_then(Value::as_bool),
        Some(true)
    );
    Ok(())
}

#[test]
fn zero_limit_is_rejected_as_invalid_input() -> io::Result<()> {
    let output = aidiag()
        .args(["simulate", "--output", "json"])
        .env("AIDIAG_THROTTLE_LIMIT", "0")
        .output()?;

    assert_eq!(output.status.code(), Some(2));
    let value: Value = serde_json::from_slice(&output.stdout).map_err(io::Error::other)?;
    assert_eq!(
        value.pointer("/status").and_then(Value::as_str),
        Some("error")
    );
    assert!(
        value
            .pointer("/error/code")
            .and_then(Value::as_str)
            .is_some_and(|code| code.starts_with("config:"))
    );
    Ok(())
}

#[test]
fn malformed_env_value_is_rejected() -> io::Result<()> {
    let output = aidiag()
        .args(["config", "show"])
        .env("AIDIAG_REPORT_LIMIT", "ten")
        .output()?;

    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("code: config:invalid_env_int"));
    Ok(())
}

#[test]
fn schema_lists_config_sections() -> io::Result<()> {
    let output = aidiag().args(["config", "schema"]).output()?;
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).map_err(io::Error::other)?;
    for section in ["logging", "loss", "drain"] {
        assert!(
            value.pointer(&format!("/properties/{section}")).is_some(),
            "missing schema section {section}"
        );
    }
    Ok(())
}

#[test]
fn info_lists_env_vars() -> io::Result<()> {
    let output = aidiag().args(["info", "--output", "json"]).output()?;
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).map_err(io::Error::other)?;
    let vars = value
        .get("envVars")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    assert!(vars.iter().any(|var| var.as_str() == Some("AIDIAG_THROTTLE_LIMIT")));
    Ok(())
}
