//! Config loading helpers (defaults + file + env).
//!
//! The loader is responsible for deterministic merge order and surfacing
//! user-facing errors as typed `ErrorEnvelope`s.

use crate::{DiagnosticsConfig, DiagnosticsEnv, ValidatedDiagnosticsConfig, apply_env_overrides};
use insights_diag_shared::{ErrorCode, ErrorEnvelope};
use std::path::Path;

/// On-disk config format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.json` (also the default when the path has no extension).
    Json,
    /// `.toml`.
    Toml,
}

impl ConfigFormat {
    /// Detect the format from a path extension.
    pub fn from_path(path: &Path) -> Result<Self, ErrorEnvelope> {
        let ext = path
            .extension()
            .and_then(|value| value.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            None | Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            Some(other) => Err(ErrorEnvelope::expected(
                ErrorCode::new("config", "unsupported_format"),
                "unsupported config format; use .json or .toml",
            )
            .with_metadata("extension", other.to_string())),
        }
    }
}

/// Load the diagnostics config from in-memory sources.
///
/// Precedence (highest wins):
/// - env overrides (`DiagnosticsEnv`)
/// - config text
/// - defaults (`DiagnosticsConfig::default()`)
pub fn load_diagnostics_config_from_sources(
    config_text: Option<(&str, ConfigFormat)>,
    env: &DiagnosticsEnv,
) -> Result<ValidatedDiagnosticsConfig, ErrorEnvelope> {
    let config = match config_text {
        None => DiagnosticsConfig::default(),
        Some((input, format)) => parse_config_unvalidated(input, format)?,
    };

    // env is applied last and also validates the resulting config.
    apply_env_overrides(config, env)
}

/// Load the diagnostics config from an optional file path.
pub fn load_diagnostics_config_from_path(
    config_path: Option<&Path>,
    env: &DiagnosticsEnv,
) -> Result<ValidatedDiagnosticsConfig, ErrorEnvelope> {
    let config = match config_path {
        None => DiagnosticsConfig::default(),
        Some(path) => {
            let format = ConfigFormat::from_path(path)?;
            let config_text = read_config_file(path)?;
            tracing::debug!(path = %path.display(), ?format, "loaded diagnostics config file");
            parse_config_unvalidated(&config_text, format)?
        },
    };

    apply_env_overrides(config, env)
}

/// Load the diagnostics config from std env and an optional file path.
pub fn load_diagnostics_config_std_env(
    config_path: Option<&Path>,
) -> Result<ValidatedDiagnosticsConfig, ErrorEnvelope> {
    let env = DiagnosticsEnv::from_std_env().map_err(ErrorEnvelope::from)?;
    if !env.is_empty() {
        tracing::debug!(?env, "applying diagnostics env overrides");
    }
    load_diagnostics_config_from_path(config_path, &env)
}

/// Serialize the config as deterministic pretty JSON (with trailing newline).
pub fn to_pretty_json(config: &DiagnosticsConfig) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config: {error}"),
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Serialize the config as deterministic pretty TOML (with trailing newline).
pub fn to_pretty_toml(config: &DiagnosticsConfig) -> Result<String, ErrorEnvelope> {
    let mut output = toml::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("config", "serialize_toml"),
            format!("failed to serialize config TOML: {error}"),
        )
    })?;
    output.push('\n');
    Ok(output)
}

fn parse_config_unvalidated(
    input: &str,
    format: ConfigFormat,
) -> Result<DiagnosticsConfig, ErrorEnvelope> {
    match format {
        ConfigFormat::Json => serde_json::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_json"),
                format!("invalid config JSON: {error}"),
            )
            .with_metadata("source", "config")
        }),
        ConfigFormat::Toml => toml::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_toml"),
                format!("invalid config TOML: {error}"),
            )
            .with_metadata("source", "config")
        }),
    }
}

fn read_config_file(path: &Path) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::new("config", "config_file_not_found"),
            std::io::ErrorKind::PermissionDenied => {
                ErrorCode::new("config", "config_file_permission_denied")
            },
            _ => ErrorCode::new("config", "config_file_io"),
        };

        ErrorEnvelope::expected(code, format!("failed to read config file: {error}"))
            .with_metadata("path", path.to_string_lossy().to_string())
    })
}
