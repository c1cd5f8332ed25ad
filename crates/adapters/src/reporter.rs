//! Loss reporter adapter.
//!
//! Reports are buffered and only reach the sink on `flush`, mirroring a
//! telemetry client that batches until asked to send. A failed flush keeps
//! the unwritten reports for the next one.

use crate::json::event_line;
use crate::log_sink::LogSink;
use insights_diag_ports::LossReporterPort;
use insights_diag_shared::{ErrorCode, ErrorEnvelope, Result};
use std::io;
use std::sync::{Arc, Mutex, PoisonError};

/// Event name stamped on every loss report.
pub const LOSS_REPORT_EVENT: &str = "telemetry.loss_report";

/// Loss reporter writing buffered reports as JSON lines.
pub struct JsonLinesReporter {
    sink: Arc<dyn LogSink>,
    pending: Mutex<Vec<String>>,
}

impl JsonLinesReporter {
    /// Create a reporter backed by the provided line sink.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Reports accepted but not yet flushed.
    pub fn pending_len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl LossReporterPort for JsonLinesReporter {
    fn report(&self, text: &str) -> Result<()> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event_line(LOSS_REPORT_EVENT, text, None));
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let mut written = 0;
        let result = pending.iter().try_for_each(|line| {
            self.sink.write_line(line)?;
            written += 1;
            Ok::<(), io::Error>(())
        });
        pending.drain(..written);

        result.map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::reporter_flush_failed(),
                format!("failed to flush loss report: {error}"),
            )
            .with_metadata("written", written.to_string())
            .with_metadata("pending", pending.len().to_string())
        })
    }
}
