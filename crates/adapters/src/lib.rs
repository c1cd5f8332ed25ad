//! # insights-diag-adapters
//!
//! Adapter implementations for the outbound ports: console echo, session
//! storage, loss reporter, and trace sink.
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod console;
mod json;
pub mod log_sink;
pub mod reporter;
pub mod storage;
pub mod trace;

pub use console::{LogSinkConsole, TracingConsole};
pub use log_sink::{LogSink, MemoryLogSink, StderrLogSink, StdoutLogSink};
pub use reporter::{JsonLinesReporter, LOSS_REPORT_EVENT};
pub use storage::{FileSessionStorage, InMemorySessionStorage};
pub use trace::{JsonTraceSink, TRACE_EVENT};

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use insights_diag_ports::ports_crate_version;
    use insights_diag_shared::shared_crate_version;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]" || line == "[dev-dependencies]";
                continue;
            }
            if in_deps && line.starts_with("insights-diag-") {
                let key = line.split('=').next().unwrap_or("").trim();
                let name = key.split('.').next().unwrap_or("").trim();
                deps.push(name.to_string());
            }
        }

        deps
    }

    #[test]
    fn adapters_do_not_depend_on_app_or_infra() {
        let forbidden = ["insights-diag-app", "insights-diag-infra"];
        for dep in workspace_deps() {
            assert!(
                !forbidden.contains(&dep.as_str()),
                "forbidden dependency found: {dep}"
            );
        }
    }

    #[test]
    fn adapters_can_use_ports_shared() {
        assert!(!adapters_crate_version().is_empty());
        assert!(!ports_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}
