//! Drain bridge from the diagnostic queue into the host telemetry stream.

use crate::diagnostic_log::DiagnosticLog;
use insights_diag_ports::TraceSinkPort;
use std::fmt;
use std::sync::Arc;

/// Counts from one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    /// Messages accepted by the trace sink.
    pub emitted: usize,
    /// Messages the trace sink rejected. These are not re-queued.
    pub failed: usize,
}

impl DrainSummary {
    /// Total messages taken from the queue.
    #[must_use]
    pub const fn total(self) -> usize {
        self.emitted + self.failed
    }
}

/// Periodic consumer that empties the diagnostic queue into a trace sink.
#[derive(Clone)]
pub struct DrainBridge {
    log: Arc<DiagnosticLog>,
    sink: Arc<dyn TraceSinkPort>,
}

impl fmt::Debug for DrainBridge {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DrainBridge")
            .field("queued", &self.log.queue_len())
            .finish_non_exhaustive()
    }
}

impl DrainBridge {
    /// Bridge `log` to `sink`.
    #[must_use]
    pub fn new(log: Arc<DiagnosticLog>, sink: Arc<dyn TraceSinkPort>) -> Self {
        Self { log, sink }
    }

    /// Emit every queued message, oldest first.
    ///
    /// The queue is taken as a whole before the first emission, so messages
    /// recorded while draining (including by the sink itself) wait for the
    /// next pass.
    pub fn drain(&self) -> DrainSummary {
        let messages = self.log.take_queue();
        let mut summary = DrainSummary::default();

        for message in &messages {
            let properties = message.has_properties().then_some(&message.properties);
            match self.sink.track_trace(&message.text, properties) {
                Ok(()) => summary.emitted += 1,
                Err(error) => {
                    summary.failed += 1;
                    tracing::debug!(code = %error.code, error = %error, "drained diagnostic dropped");
                },
            }
        }

        if summary.total() > 0 {
            tracing::trace!(emitted = summary.emitted, failed = summary.failed, "diagnostic queue drained");
        }
        summary
    }
}
