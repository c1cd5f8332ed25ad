//! CLI command handlers.

pub mod config;
pub mod info;
pub mod ledger;
pub mod simulate;

pub use config::{run_config_schema, run_config_show};
pub use info::run_info;
pub use ledger::{LedgerAction, run_ledger};
pub use simulate::{SimulateCommandInput, run_simulate_command};

use crate::error::CliError;
use serde_json::Value;

/// Parse captured JSON lines back into values.
pub(crate) fn parse_event_lines(lines: &[String]) -> Result<Vec<Value>, CliError> {
    lines
        .iter()
        .map(|line| serde_json::from_str(line.trim()).map_err(CliError::from))
        .collect()
}
