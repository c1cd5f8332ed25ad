//! # insights-diag-config
//!
//! Configuration schema, validation, and env overrides for the diagnostics
//! subsystem. This crate depends on `domain` and `shared` only.

/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (file + env).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use schema::{
    CURRENT_CONFIG_VERSION, ConfigSchemaError, DiagnosticsConfig, DiagnosticsLimits, DrainConfig,
    INTERVAL_MAX_MS, INTERVAL_MIN_MS, LoggingConfig, LossConfig, ValidatedDiagnosticsConfig,
    diagnostics_config_schema, parse_diagnostics_config_json, parse_diagnostics_config_toml,
};

pub use env::{DiagnosticsEnv, ENV_VARS, EnvParseError, apply_env_overrides};
pub use load::{
    ConfigFormat, load_diagnostics_config_from_path, load_diagnostics_config_from_sources,
    load_diagnostics_config_std_env, to_pretty_json, to_pretty_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use insights_diag_domain::domain_crate_version;
    use insights_diag_shared::shared_crate_version;

    #[test]
    fn config_crate_compiles() {
        let version = config_crate_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn config_can_use_domain_and_shared() {
        let domain_version = domain_crate_version();
        let shared_version = shared_crate_version();

        assert!(!domain_version.is_empty());
        assert!(!shared_version.is_empty());
    }
}
