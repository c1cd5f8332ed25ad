//! Recording doubles for the outbound ports.
//!
//! Each double records every call it receives and can be switched into a
//! failing mode to exercise the fail-open paths of the diagnostics core.

use insights_diag_ports::{
    ConsoleChannel, ConsoleSinkPort, LossReporterPort, MessageProperties, TraceSinkPort,
};
use insights_diag_shared::{ErrorCode, ErrorEnvelope, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

fn push<T>(target: &Mutex<Vec<T>>, value: T) {
    target
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(value);
}

fn snapshot<T: Clone>(source: &Mutex<Vec<T>>) -> Vec<T> {
    source.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Console double exposing a configurable set of channels.
#[derive(Debug)]
pub struct RecordingConsole {
    channels: Vec<ConsoleChannel>,
    lines: Mutex<Vec<(ConsoleChannel, String)>>,
    fail_writes: AtomicBool,
}

impl RecordingConsole {
    /// Console exposing exactly `channels`.
    pub fn with_channels(channels: &[ConsoleChannel]) -> Self {
        Self {
            channels: channels.to_vec(),
            lines: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Console exposing both `warn` and `log`.
    pub fn full() -> Self {
        Self::with_channels(&[ConsoleChannel::Warn, ConsoleChannel::Log])
    }

    /// Console exposing no channel at all.
    pub fn silent() -> Self {
        Self::with_channels(&[])
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Every successful write, in order.
    pub fn lines(&self) -> Vec<(ConsoleChannel, String)> {
        snapshot(&self.lines)
    }

    /// Text of every successful write, in order.
    pub fn texts(&self) -> Vec<String> {
        self.lines().into_iter().map(|(_, line)| line).collect()
    }
}

impl ConsoleSinkPort for RecordingConsole {
    fn has_channel(&self, channel: ConsoleChannel) -> bool {
        self.channels.contains(&channel)
    }

    fn write(&self, channel: ConsoleChannel, line: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ErrorEnvelope::unexpected(
                ErrorCode::console_write_failed(),
                "console rejected write",
            ));
        }
        push(&self.lines, (channel, line.to_string()));
        Ok(())
    }
}

/// Loss reporter double.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<String>>,
    flushes: AtomicUsize,
    fail_report: AtomicBool,
    fail_flush: AtomicBool,
}

impl RecordingReporter {
    /// Healthy reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `report` fail.
    pub fn fail_report(&self, fail: bool) {
        self.fail_report.store(fail, Ordering::SeqCst);
    }

    /// Make `flush` fail.
    pub fn fail_flush(&self, fail: bool) {
        self.fail_flush.store(fail, Ordering::SeqCst);
    }

    /// Every report call, including failed ones, in order.
    pub fn reports(&self) -> Vec<String> {
        snapshot(&self.reports)
    }

    /// Number of flush calls, including failed ones.
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl LossReporterPort for RecordingReporter {
    fn report(&self, message: &str) -> Result<()> {
        push(&self.reports, message.to_string());
        if self.fail_report.load(Ordering::SeqCst) {
            return Err(ErrorEnvelope::unexpected(
                ErrorCode::reporter_report_failed(),
                "reporter rejected report",
            ));
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        if self.fail_flush.load(Ordering::SeqCst) {
            return Err(ErrorEnvelope::unexpected(
                ErrorCode::reporter_flush_failed(),
                "reporter flush failed",
            ));
        }
        Ok(())
    }
}

/// One recorded `track_trace` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTrace {
    /// Trace text.
    pub text: String,
    /// Properties, `None` when the call carried none.
    pub properties: Option<MessageProperties>,
}

/// Trace sink double.
#[derive(Debug, Default)]
pub struct RecordingTraceSink {
    traces: Mutex<Vec<RecordedTrace>>,
    fail_containing: Mutex<Option<String>>,
}

impl RecordingTraceSink {
    /// Healthy sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject traces whose text contains `needle`.
    pub fn fail_when_text_contains(&self, needle: impl Into<String>) {
        *self
            .fail_containing
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(needle.into());
    }

    /// Every accepted trace, in order.
    pub fn traces(&self) -> Vec<RecordedTrace> {
        snapshot(&self.traces)
    }
}

impl TraceSinkPort for RecordingTraceSink {
    fn track_trace(&self, text: &str, properties: Option<&MessageProperties>) -> Result<()> {
        let rejected = self
            .fail_containing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
            .is_some_and(|needle| text.contains(needle));
        if rejected {
            return Err(ErrorEnvelope::unexpected(
                ErrorCode::trace_emit_failed(),
                "trace sink rejected message",
            ));
        }
        push(
            &self.traces,
            RecordedTrace {
                text: text.to_string(),
                properties: properties.cloned(),
            },
        );
        Ok(())
    }
}
