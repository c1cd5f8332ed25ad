//! Info command handler.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, pretty_json, push_ndjson};
use insights_diag_infra::{ENV_VARS, infra_crate_version};

/// Run the info command.
pub fn run_info(mode: OutputMode) -> Result<CliOutput, CliError> {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");
    let infra_version = infra_crate_version();

    let stdout = if mode.is_json() || mode.is_ndjson() {
        let payload = serde_json::json!({
            "status": "ok",
            "build": {
                "name": name,
                "version": version,
                "infraVersion": infra_version,
            },
            "envVars": ENV_VARS,
        });
        if mode.is_ndjson() {
            let mut out = String::new();
            push_ndjson(&mut out, "summary", payload)?;
            out
        } else {
            pretty_json(&payload)?
        }
    } else {
        format!(
            "status: ok\nname: {name}\nversion: {version}\ninfra: {infra_version}\nenv: {}\n",
            ENV_VARS.join(", ")
        )
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}
