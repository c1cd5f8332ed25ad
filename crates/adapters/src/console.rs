//! Console adapters for the diagnostic log echo.

use crate::log_sink::LogSink;
use insights_diag_ports::{ConsoleChannel, ConsoleSinkPort};
use insights_diag_shared::{ErrorCode, ErrorEnvelope, Result};
use std::sync::Arc;

/// Console writing `"<channel>: <text>"` lines to a line sink.
#[derive(Clone)]
pub struct LogSinkConsole {
    sink: Arc<dyn LogSink>,
    channels: Vec<ConsoleChannel>,
}

impl LogSinkConsole {
    /// Console exposing both `warn` and `log` over `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self::with_channels(sink, &[ConsoleChannel::Warn, ConsoleChannel::Log])
    }

    /// Console exposing only `channels`.
    #[must_use]
    pub fn with_channels(sink: Arc<dyn LogSink>, channels: &[ConsoleChannel]) -> Self {
        Self {
            sink,
            channels: channels.to_vec(),
        }
    }
}

impl ConsoleSinkPort for LogSinkConsole {
    fn has_channel(&self, channel: ConsoleChannel) -> bool {
        self.channels.contains(&channel)
    }

    fn write(&self, channel: ConsoleChannel, text: &str) -> Result<()> {
        self.sink
            .write_line(&format!("{channel}: {text}\n"))
            .map_err(|error| {
                ErrorEnvelope::expected(
                    ErrorCode::console_write_failed(),
                    format!("console write failed: {error}"),
                )
                .with_metadata("channel", channel.as_str())
            })
    }
}

/// Console routing lines into `tracing` events.
///
/// `warn` maps to `WARN` and `log` maps to `INFO`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingConsole;

impl ConsoleSinkPort for TracingConsole {
    fn has_channel(&self, _channel: ConsoleChannel) -> bool {
        true
    }

    fn write(&self, channel: ConsoleChannel, text: &str) -> Result<()> {
        match channel {
            ConsoleChannel::Warn => tracing::warn!(target: "insights_diag::console", "{text}"),
            ConsoleChannel::Log => tracing::info!(target: "insights_diag::console", "{text}"),
        }
        Ok(())
    }
}
