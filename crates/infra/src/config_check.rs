//! Config loading helpers for CLI surfaces.

use crate::InfraResult;
use insights_diag_config::{
    DiagnosticsEnv, ValidatedDiagnosticsConfig, diagnostics_config_schema,
    load_diagnostics_config_from_path, to_pretty_json, to_pretty_toml,
};
use insights_diag_shared::{ErrorCode, ErrorEnvelope};
use std::collections::BTreeMap;
use std::path::Path;

/// Output format for `config show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigOutputFormat {
    /// Pretty JSON.
    #[default]
    Json,
    /// Pretty TOML.
    Toml,
}

/// Load and validate the effective config from an env map and optional file.
pub fn load_effective_config(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
) -> InfraResult<ValidatedDiagnosticsConfig> {
    let env = DiagnosticsEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    load_diagnostics_config_from_path(config_path, &env)
}

/// Load and validate the effective config, returning deterministic pretty output.
pub fn render_effective_config(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    format: ConfigOutputFormat,
) -> InfraResult<String> {
    let config = load_effective_config(env, config_path)?;
    match format {
        ConfigOutputFormat::Json => to_pretty_json(config.as_ref()),
        ConfigOutputFormat::Toml => to_pretty_toml(config.as_ref()),
    }
}

/// The config JSON Schema as pretty JSON.
pub fn config_schema_json() -> InfraResult<String> {
    let schema = diagnostics_config_schema();
    let mut output = serde_json::to_string_pretty(&schema).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config schema: {error}"),
        )
    })?;
    output.push('\n');
    Ok(output)
}
