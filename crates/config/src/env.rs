//! Environment variable parsing and env-to-config merging.
//!
//! Parsing is strict: a variable that is present but empty or malformed fails
//! fast instead of silently falling back to the file or default value.

use crate::schema::{DiagnosticsConfig, ValidatedDiagnosticsConfig};
use insights_diag_shared::{ErrorCode, ErrorEnvelope, redact_if_secret};
use std::collections::BTreeMap;
use std::fmt;

/// Env var: queue warnings as well as critical messages.
pub const ENV_VERBOSE_LOGGING: &str = "AIDIAG_VERBOSE_LOGGING";
/// Env var: raise diagnostics instead of recording them.
pub const ENV_DEBUG_EXCEPTIONS: &str = "AIDIAG_DEBUG_EXCEPTIONS";
/// Env var: per-page-view throttle limit.
pub const ENV_THROTTLE_LIMIT: &str = "AIDIAG_THROTTLE_LIMIT";
/// Env var: per-session loss report limit.
pub const ENV_REPORT_LIMIT: &str = "AIDIAG_REPORT_LIMIT";
/// Env var: loss check interval in milliseconds.
pub const ENV_LOSS_CHECK_INTERVAL_MS: &str = "AIDIAG_LOSS_CHECK_INTERVAL_MS";
/// Env var: drain interval in milliseconds.
pub const ENV_DRAIN_INTERVAL_MS: &str = "AIDIAG_DRAIN_INTERVAL_MS";

/// Every env var this crate reads.
pub const ENV_VARS: [&str; 6] = [
    ENV_VERBOSE_LOGGING,
    ENV_DEBUG_EXCEPTIONS,
    ENV_THROTTLE_LIMIT,
    ENV_REPORT_LIMIT,
    ENV_LOSS_CHECK_INTERVAL_MS,
    ENV_DRAIN_INTERVAL_MS,
];

/// Typed env-derived overrides for `DiagnosticsConfig`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticsEnv {
    /// Override for `logging.verboseLogging`.
    pub verbose_logging: Option<bool>,
    /// Override for `logging.debugExceptions`.
    pub debug_exceptions: Option<bool>,
    /// Override for `logging.throttleLimit`.
    pub throttle_limit: Option<u32>,
    /// Override for `loss.reportLimit`.
    pub report_limit: Option<u32>,
    /// Override for `loss.checkIntervalMs`.
    pub loss_check_interval_ms: Option<u64>,
    /// Override for `drain.intervalMs`.
    pub drain_interval_ms: Option<u64>,
}

impl DiagnosticsEnv {
    /// Parse env overrides from a key/value map (useful for tests and fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            verbose_logging: parse_optional_bool(map, ENV_VERBOSE_LOGGING)?,
            debug_exceptions: parse_optional_bool(map, ENV_DEBUG_EXCEPTIONS)?,
            throttle_limit: parse_optional_u32(map, ENV_THROTTLE_LIMIT)?,
            report_limit: parse_optional_u32(map, ENV_REPORT_LIMIT)?,
            loss_check_interval_ms: parse_optional_u64(map, ENV_LOSS_CHECK_INTERVAL_MS)?,
            drain_interval_ms: parse_optional_u64(map, ENV_DRAIN_INTERVAL_MS)?,
        })
    }

    /// Parse env overrides from the current process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let map = ENV_VARS
            .iter()
            .filter_map(|name| {
                std::env::var(name)
                    .ok()
                    .map(|value| ((*name).to_string(), value))
            })
            .collect();
        Self::from_map(&map)
    }

    /// Returns true when no override is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.verbose_logging.is_none()
            && self.debug_exceptions.is_none()
            && self.throttle_limit.is_none()
            && self.report_limit.is_none()
            && self.loss_check_interval_ms.is_none()
            && self.drain_interval_ms.is_none()
    }
}

/// Apply env overrides to a base config (env wins over file/default values).
pub fn apply_env_overrides(
    base: DiagnosticsConfig,
    env: &DiagnosticsEnv,
) -> Result<ValidatedDiagnosticsConfig, ErrorEnvelope> {
    let mut config = base;
    set_if_some(&mut config.logging.verbose_logging, env.verbose_logging);
    set_if_some(&mut config.logging.debug_exceptions, env.debug_exceptions);
    set_if_some(&mut config.logging.throttle_limit, env.throttle_limit);
    set_if_some(&mut config.loss.report_limit, env.report_limit);
    set_if_some(&mut config.loss.check_interval_ms, env.loss_check_interval_ms);
    set_if_some(&mut config.drain.interval_ms, env.drain_interval_ms);

    config.validate_and_normalize().map_err(Into::into)
}

fn set_if_some<T: Copy>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

/// Validation failures when parsing env variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Boolean env var had an invalid value.
    InvalidBool {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Integer env var had an invalid value.
    InvalidInt {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } => ErrorCode::new("config", "empty_env_var"),
            Self::InvalidBool { .. } => ErrorCode::new("config", "invalid_env_bool"),
            Self::InvalidInt { .. } => ErrorCode::new("config", "invalid_env_int"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(formatter, "{var} must be non-empty"),
            Self::InvalidBool { var, .. } => write!(formatter, "{var} must be a boolean"),
            Self::InvalidInt { var, .. } => write!(formatter, "{var} must be an integer"),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            EnvParseError::EmptyValue { var } => envelope.with_metadata("env_var", var),
            EnvParseError::InvalidBool { var, value } | EnvParseError::InvalidInt { var, value } => {
                envelope
                    .with_metadata("env_var", var)
                    .with_metadata("value", redact_if_secret(var, &value))
            },
        }
    }
}

fn parse_optional_trimmed<'a>(
    map: &'a BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<&'a str>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }
    Ok(Some(trimmed))
}

fn parse_optional_u64(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u64>, EnvParseError> {
    parse_optional_trimmed(map, var)?
        .map(|trimmed| {
            trimmed
                .parse::<u64>()
                .map_err(|_| EnvParseError::InvalidInt {
                    var,
                    value: trimmed.to_string(),
                })
        })
        .transpose()
}

fn parse_optional_u32(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u32>, EnvParseError> {
    parse_optional_trimmed(map, var)?
        .map(|trimmed| {
            trimmed
                .parse::<u32>()
                .map_err(|_| EnvParseError::InvalidInt {
                    var,
                    value: trimmed.to_string(),
                })
        })
        .transpose()
}

fn parse_optional_bool(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<bool>, EnvParseError> {
    let Some(trimmed) = parse_optional_trimmed(map, var)? else {
        return Ok(None);
    };

    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(EnvParseError::InvalidBool {
            var,
            value: trimmed.to_string(),
        }),
    }
}
