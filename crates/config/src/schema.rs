//! Diagnostics configuration schema, defaults, validation, and normalization.
//!
//! - Deserialization uses `serde` (JSON or TOML).
//! - Validation is manual and returns typed errors mapped to `ErrorEnvelope`.
//! - Raw numeric limits become domain types (`ThrottleLimit`, `ReportLimit`)
//!   only after validation.

use insights_diag_domain::{
    DEFAULT_REPORT_LIMIT, DEFAULT_THROTTLE_LIMIT, LimitError, ReportLimit, ThrottleLimit,
};
use insights_diag_shared::{ErrorCode, ErrorEnvelope};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Current supported configuration schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Lower bound for every periodic interval (ms).
pub const INTERVAL_MIN_MS: u64 = 100;
/// Upper bound for every periodic interval (ms).
pub const INTERVAL_MAX_MS: u64 = 3_600_000;

const DEFAULT_LOSS_CHECK_INTERVAL_MS: u64 = 60_000;
const DEFAULT_DRAIN_INTERVAL_MS: u64 = 15_000;

/// Top-level diagnostics configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct DiagnosticsConfig {
    /// Schema version for forward-compatible migrations.
    pub version: u32,
    /// Diagnostic log behavior.
    pub logging: LoggingConfig,
    /// Loss ledger behavior.
    pub loss: LossConfig,
    /// Drain bridge behavior.
    pub drain: DrainConfig,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            logging: LoggingConfig::default(),
            loss: LossConfig::default(),
            drain: DrainConfig::default(),
        }
    }
}

impl DiagnosticsConfig {
    /// Validate and normalize the config.
    pub fn validate_and_normalize(self) -> Result<ValidatedDiagnosticsConfig, ConfigSchemaError> {
        self.validate_version()?;
        let limits = DiagnosticsLimits::new(&self)?;
        Ok(ValidatedDiagnosticsConfig { raw: self, limits })
    }

    const fn validate_version(&self) -> Result<(), ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_CONFIG_VERSION,
            });
        }
        Ok(())
    }
}

/// Diagnostic log settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// Queue warnings as well as critical messages.
    pub verbose_logging: bool,
    /// Raise diagnostics back to the caller instead of recording them.
    pub debug_exceptions: bool,
    /// Max diagnostics queued per page view.
    pub throttle_limit: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            verbose_logging: false,
            debug_exceptions: false,
            throttle_limit: DEFAULT_THROTTLE_LIMIT,
        }
    }
}

/// Loss ledger settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct LossConfig {
    /// Max loss reports emitted per session.
    pub report_limit: u32,
    /// How often the loss check runs (ms).
    pub check_interval_ms: u64,
}

impl Default for LossConfig {
    fn default() -> Self {
        Self {
            report_limit: DEFAULT_REPORT_LIMIT,
            check_interval_ms: DEFAULT_LOSS_CHECK_INTERVAL_MS,
        }
    }
}

/// Drain bridge settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct DrainConfig {
    /// How often the diagnostic queue is drained (ms).
    pub interval_ms: u64,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_DRAIN_INTERVAL_MS,
        }
    }
}

/// Validated config wrapper carrying domain-typed limits.
#[derive(Debug, Clone)]
pub struct ValidatedDiagnosticsConfig {
    raw: DiagnosticsConfig,
    limits: DiagnosticsLimits,
}

impl ValidatedDiagnosticsConfig {
    /// Access validated limits.
    #[must_use]
    pub const fn limits(&self) -> &DiagnosticsLimits {
        &self.limits
    }

    /// Borrow the raw config.
    #[must_use]
    pub const fn as_ref(&self) -> &DiagnosticsConfig {
        &self.raw
    }

    /// Consume the wrapper and return the raw config.
    #[must_use]
    pub fn into_inner(self) -> DiagnosticsConfig {
        self.raw
    }
}

impl AsRef<DiagnosticsConfig> for ValidatedDiagnosticsConfig {
    fn as_ref(&self) -> &DiagnosticsConfig {
        &self.raw
    }
}

impl std::ops::Deref for ValidatedDiagnosticsConfig {
    type Target = DiagnosticsConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Limits and intervals derived from a validated config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticsLimits {
    /// Per-page-view throttle limit.
    pub throttle_limit: ThrottleLimit,
    /// Per-session report limit.
    pub report_limit: ReportLimit,
    /// Loss check period.
    pub loss_check_interval: Duration,
    /// Drain period.
    pub drain_interval: Duration,
}

impl DiagnosticsLimits {
    fn new(config: &DiagnosticsConfig) -> Result<Self, ConfigSchemaError> {
        let throttle_limit = ThrottleLimit::new(config.logging.throttle_limit)
            .map_err(|error| ConfigSchemaError::invalid_limit("logging", "throttleLimit", error))?;
        let report_limit = ReportLimit::new(config.loss.report_limit)
            .map_err(|error| ConfigSchemaError::invalid_limit("loss", "reportLimit", error))?;

        Ok(Self {
            throttle_limit,
            report_limit,
            loss_check_interval: validate_interval_ms(
                "loss",
                "checkIntervalMs",
                config.loss.check_interval_ms,
            )?,
            drain_interval: validate_interval_ms("drain", "intervalMs", config.drain.interval_ms)?,
        })
    }
}

/// Parse a diagnostics config from a JSON string, applying validation.
pub fn parse_diagnostics_config_json(
    input: &str,
) -> Result<ValidatedDiagnosticsConfig, ErrorEnvelope> {
    let config: DiagnosticsConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Parse a diagnostics config from a TOML string, applying validation.
pub fn parse_diagnostics_config_toml(
    input: &str,
) -> Result<ValidatedDiagnosticsConfig, ErrorEnvelope> {
    let config: DiagnosticsConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// JSON Schema for `DiagnosticsConfig`.
#[must_use]
pub fn diagnostics_config_schema() -> schemars::Schema {
    schemars::schema_for!(DiagnosticsConfig)
}

/// Typed validation errors for the configuration schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// The config version is not supported by this binary.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
    /// A periodic interval is out of bounds.
    IntervalOutOfRange {
        /// Schema section (e.g. `drain`).
        section: &'static str,
        /// Field name in the config file (e.g. `intervalMs`).
        field: &'static str,
        /// Value provided (ms).
        value_ms: u64,
        /// Minimum allowed value (ms).
        min_ms: u64,
        /// Maximum allowed value (ms).
        max_ms: u64,
    },
    /// A rate limit was rejected by the domain.
    InvalidLimit {
        /// Schema section (e.g. `logging`).
        section: &'static str,
        /// Field name in the config file (e.g. `throttleLimit`).
        field: &'static str,
        /// Domain rejection.
        source: LimitError,
    },
}

impl ConfigSchemaError {
    const fn invalid_limit(section: &'static str, field: &'static str, source: LimitError) -> Self {
        Self::InvalidLimit {
            section,
            field,
            source,
        }
    }

    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::IntervalOutOfRange { .. } => ErrorCode::new("config", "invalid_interval"),
            Self::InvalidLimit { .. } => ErrorCode::new("config", "invalid_limit"),
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => {
                write!(
                    formatter,
                    "unsupported config version: {found} (supported: {supported})"
                )
            },
            Self::IntervalOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => write!(
                formatter,
                "{section}.{field} must be within [{min_ms}, {max_ms}] ms (got {value_ms})"
            ),
            Self::InvalidLimit {
                section,
                field,
                source,
            } => write!(formatter, "{section}.{field}: {source}"),
        }
    }
}

impl std::error::Error for ConfigSchemaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidLimit { source, .. } => Some(source),
            Self::UnsupportedVersion { .. } | Self::IntervalOutOfRange { .. } => None,
        }
    }
}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let mut envelope = Self::expected(code, message);

        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => {
                envelope = envelope
                    .with_metadata("found", found.to_string())
                    .with_metadata("supported", supported.to_string());
            },
            ConfigSchemaError::IntervalOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => {
                envelope = envelope
                    .with_metadata("section", section)
                    .with_metadata("field", field)
                    .with_metadata("value_ms", value_ms.to_string())
                    .with_metadata("min_ms", min_ms.to_string())
                    .with_metadata("max_ms", max_ms.to_string());
            },
            ConfigSchemaError::InvalidLimit { section, field, .. } => {
                envelope = envelope
                    .with_metadata("section", section)
                    .with_metadata("field", field);
            },
        }

        envelope
    }
}

const fn validate_interval_ms(
    section: &'static str,
    field: &'static str,
    value_ms: u64,
) -> Result<Duration, ConfigSchemaError> {
    if value_ms < INTERVAL_MIN_MS || value_ms > INTERVAL_MAX_MS {
        return Err(ConfigSchemaError::IntervalOutOfRange {
            section,
            field,
            value_ms,
            min_ms: INTERVAL_MIN_MS,
            max_ms: INTERVAL_MAX_MS,
        });
    }
    Ok(Duration::from_millis(value_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn defaults_are_applied() -> Result<(), Box<dyn Error>> {
        let config = parse_diagnostics_config_json("{}")?;

        assert_eq!(config.version, CURRENT_CONFIG_VERSION);
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.loss, LossConfig::default());
        assert_eq!(config.drain, DrainConfig::default());
        assert_eq!(config.limits().throttle_limit.get(), 25);
        assert_eq!(config.limits().report_limit.get(), 10);
        assert_eq!(config.limits().drain_interval, Duration::from_secs(15));
        Ok(())
    }

    #[test]
    fn zero_throttle_limit_is_rejected() -> Result<(), Box<dyn Error>> {
        let payload = serde_json::json!({ "logging": { "throttleLimit": 0 } });

        let error = parse_diagnostics_config_json(&payload.to_string())
            .err()
            .ok_or_else(|| std::io::Error::other("expected validation error"))?;
        assert_eq!(error.code, ErrorCode::new("config", "invalid_limit"));
        assert_eq!(
            error.metadata.get("field").map(String::as_str),
            Some("throttleLimit")
        );
        Ok(())
    }

    #[test]
    fn interval_bounds_are_enforced() -> Result<(), Box<dyn Error>> {
        let payload = serde_json::json!({ "drain": { "intervalMs": 50 } });

        let error = parse_diagnostics_config_json(&payload.to_string())
            .err()
            .ok_or_else(|| std::io::Error::other("expected validation error"))?;
        assert_eq!(error.code, ErrorCode::new("config", "invalid_interval"));
        assert_eq!(
            error.metadata.get("section").map(String::as_str),
            Some("drain")
        );
        Ok(())
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = parse_diagnostics_config_json(r#"{"logging":{"verbose":true}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn unsupported_version_is_rejected() -> Result<(), Box<dyn Error>> {
        let error = parse_diagnostics_config_json(r#"{"version":2}"#)
            .err()
            .ok_or_else(|| std::io::Error::other("expected version error"))?;
        assert_eq!(error.code, ErrorCode::new("config", "unsupported_version"));
        Ok(())
    }

    #[test]
    fn toml_is_accepted() -> Result<(), Box<dyn Error>> {
        let config = parse_diagnostics_config_toml(
            "version = 1\n[logging]\nverboseLogging = true\nthrottleLimit = 5\n",
        )?;
        assert!(config.logging.verbose_logging);
        assert_eq!(config.limits().throttle_limit.get(), 5);
        Ok(())
    }

    #[test]
    fn schema_names_every_section() -> Result<(), Box<dyn Error>> {
        let schema = serde_json::to_value(diagnostics_config_schema())?;
        let properties = schema
            .get("properties")
            .ok_or_else(|| std::io::Error::other("schema has no properties"))?;
        for section in ["version", "logging", "loss", "drain"] {
            assert!(properties.get(section).is_some(), "missing {section}");
        }
        Ok(())
    }
}
