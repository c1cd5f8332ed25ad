//! Config command handlers.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use insights_diag_infra::{ConfigOutputFormat, config_schema_json, render_effective_config};
use std::collections::BTreeMap;
use std::path::Path;

/// Print the effective config (defaults < file < env).
pub fn run_config_show(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    format: ConfigOutputFormat,
) -> Result<CliOutput, CliError> {
    Ok(CliOutput {
        stdout: render_effective_config(env, config_path, format)?,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

/// Print the config JSON Schema.
pub fn run_config_schema() -> Result<CliOutput, CliError> {
    Ok(CliOutput {
        stdout: config_schema_json()?,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}
