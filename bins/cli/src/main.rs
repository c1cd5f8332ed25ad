//! CLI binary entrypoint.

mod commands;
mod error;
mod format;
mod logging;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{
    LedgerAction, SimulateCommandInput, run_config_schema, run_config_show, run_info, run_ledger,
    run_simulate_command,
};
use error::{CliError, ExitCode, envelope_exit_code};
use format::{OutputArgs, OutputMode, pretty_json, push_ndjson};
use insights_diag_infra::{
    ConfigOutputFormat, ValidatedDiagnosticsConfig, is_secret_key, load_effective_config,
};
use insights_diag_shared::ErrorEnvelope;
use logging::{LogFormat, init_logging};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "AIDIAG_";

#[derive(Debug, Parser)]
#[command(
    name = "aidiag",
    version,
    about = "Internal diagnostics log and telemetry loss ledger",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    /// Optional config file path (JSON/TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Format of `tracing` output on stderr (filter via `RUST_LOG`).
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show build and version details.
    Info,
    /// Simulate page views against an in-memory session and print what drains.
    Simulate {
        /// Page views to simulate.
        #[arg(long, default_value_t = 1)]
        page_views: u32,
        /// Critical diagnostics per page view.
        #[arg(long, default_value_t = 3)]
        critical: u32,
        /// Warning diagnostics per page view.
        #[arg(long, default_value_t = 0)]
        warnings: u32,
        /// Telemetry items enqueued per page view.
        #[arg(long, default_value_t = 0)]
        items: u64,
        /// Telemetry items confirmed sent per page view.
        #[arg(long, default_value_t = 0)]
        confirmed: u64,
        /// Run the timed pump for this many milliseconds before unloading.
        #[arg(long)]
        pump_ms: Option<u64>,
    },
    /// Loss ledger commands against a file-backed session.
    Ledger {
        /// Session file (one JSON object per session).
        #[arg(long, global = true, default_value = ".aidiag-session.json")]
        session: PathBuf,
        #[command(subcommand)]
        command: LedgerCommands,
    },
    /// Config-related commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
enum LedgerCommands {
    /// Print the persisted counters.
    Status,
    /// Count items as enqueued.
    Enqueue {
        #[arg(long, default_value_t = 1)]
        count: u64,
    },
    /// Confirm items as sent.
    Confirm {
        #[arg(long)]
        count: u64,
    },
    /// Run one loss check and emit a report when items went missing.
    Report,
    /// Delete the session file.
    Reset,
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Print the effective config (defaults < file < env).
    Show {
        /// Rendering format.
        #[arg(long, value_enum, default_value_t = ConfigFormatArg::Json)]
        format: ConfigFormatArg,
    },
    /// Print the config JSON Schema.
    Schema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ConfigFormatArg {
    Json,
    Toml,
}

impl From<ConfigFormatArg> for ConfigOutputFormat {
    fn from(value: ConfigFormatArg) -> Self {
        match value {
            ConfigFormatArg::Json => Self::Json,
            ConfigFormatArg::Toml => Self::Toml,
        }
    }
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_format);
    let mode = OutputMode::from_args(&cli.output);

    let output = match run(&cli, mode) {
        Ok(output) => output,
        Err(CliError::Envelope(error)) => format_error_output(mode, &error),
        Err(error) => return exit_with_error(&error),
    };
    match write_output(&output) {
        Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
        Err(error) => exit_with_error(&error),
    }
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(cli: &Cli, mode: OutputMode) -> Result<CliOutput, CliError> {
    let env = collect_scoped_env(ENV_PREFIX);
    let config_path = cli.config.as_deref();
    match &cli.command {
        Commands::Info => run_info(mode),
        Commands::Config { command } => match command {
            ConfigCommands::Show { format } => {
                run_config_show(&env, config_path, (*format).into())
            },
            ConfigCommands::Schema => run_config_schema(),
        },
        Commands::Simulate {
            page_views,
            critical,
            warnings,
            items,
            confirmed,
            pump_ms,
        } => {
            let config = load_config(&env, config_path)?;
            run_simulate_command(
                mode,
                &config,
                SimulateCommandInput {
                    page_views: *page_views,
                    critical: *critical,
                    warnings: *warnings,
                    items: *items,
                    confirmed: *confirmed,
                    pump_ms: *pump_ms,
                },
            )
        },
        Commands::Ledger { session, command } => {
            let config = load_config(&env, config_path)?;
            let action = match command {
                LedgerCommands::Status => LedgerAction::Status,
                LedgerCommands::Enqueue { count } => LedgerAction::Enqueue(*count),
                LedgerCommands::Confirm { count } => LedgerAction::Confirm(*count),
                LedgerCommands::Report => LedgerAction::Report,
                LedgerCommands::Reset => LedgerAction::Reset,
            };
            run_ledger(mode, &config, session, action)
        },
    }
}

fn load_config(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
) -> Result<ValidatedDiagnosticsConfig, CliError> {
    Ok(load_effective_config(env, config_path)?)
}

pub(crate) fn format_error_output(mode: OutputMode, error: &ErrorEnvelope) -> CliOutput {
    let exit_code = envelope_exit_code(error);
    let mut stderr = String::new();
    log_info(&mut stderr, "command failed", mode.no_progress);

    let payload = error_payload(error);
    let stdout = if mode.is_ndjson() {
        let mut out = String::new();
        push_ndjson(
            &mut out,
            "error",
            serde_json::json!({ "status": "error", "error": payload }),
        )
        .map_or_else(|_| fallback_error_json(), |()| out)
    } else if mode.is_json() {
        // This is a CLI boundary, so JSON serialization errors are internal.
        pretty_json(&serde_json::json!({ "status": "error", "error": payload }))
            .unwrap_or_else(|_| fallback_error_json())
    } else {
        format_error_text(&payload)
    };

    CliOutput {
        stdout,
        stderr,
        exit_code,
    }
}

fn error_payload(error: &ErrorEnvelope) -> Value {
    let meta: serde_json::Map<String, Value> = error
        .metadata
        .iter()
        .map(|(key, value)| {
            let value = if is_secret_key(key) {
                "<redacted>".to_string()
            } else {
                value.clone()
            };
            (key.clone(), Value::String(value))
        })
        .collect();
    serde_json::json!({
        "code": error.code.to_string(),
        "message": error.message,
        "kind": error.kind.to_string(),
        "meta": meta,
    })
}

fn fallback_error_json() -> String {
    "{\"status\":\"error\",\"error\":{\"code\":\"core:internal\",\"message\":\"internal error\",\"kind\":\"invariant\"}}\n"
        .to_string()
}

fn format_error_text(payload: &Value) -> String {
    let mut out = String::from("status: error\n");
    for key in ["code", "message", "kind"] {
        if let Some(value) = payload.get(key).and_then(Value::as_str) {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
    }
    let meta = payload.get("meta").and_then(Value::as_object);
    if let Some(meta) = meta.filter(|meta| !meta.is_empty()) {
        out.push_str("meta:\n");
        for (key, value) in meta {
            out.push_str("  ");
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value.as_str().unwrap_or_default());
            out.push('\n');
        }
    }
    out
}

/// Render a JSON object as `key: value` lines, nested keys joined with `.`.
pub(crate) fn format_fields_text(value: &Value) -> String {
    let mut out = String::new();
    push_fields_text(&mut out, "", value);
    out
}

fn push_fields_text(out: &mut String, prefix: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                push_fields_text(out, &path, nested);
            }
        },
        Value::String(text) => {
            out.push_str(prefix);
            out.push_str(": ");
            out.push_str(text);
            out.push('\n');
        },
        other => {
            out.push_str(prefix);
            out.push_str(": ");
            out.push_str(&other.to_string());
            out.push('\n');
        },
    }
}

pub(crate) fn log_info(stderr: &mut String, message: &str, no_progress: bool) {
    if no_progress {
        return;
    }
    stderr.push_str("info: ");
    stderr.push_str(message);
    stderr.push('\n');
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}

fn collect_scoped_env(prefix: &str) -> BTreeMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with(prefix))
        .collect()
}
