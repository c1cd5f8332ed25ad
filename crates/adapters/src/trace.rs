//! Trace sink adapter emitting drained diagnostics as JSON lines.

use crate::json::event_line;
use crate::log_sink::LogSink;
use insights_diag_ports::{MessageProperties, TraceSinkPort};
use insights_diag_shared::{ErrorCode, ErrorEnvelope, Result};
use std::sync::Arc;

/// Event name stamped on every drained diagnostic.
pub const TRACE_EVENT: &str = "diagnostics.trace";

/// Trace sink writing one JSON object per drained message.
#[derive(Clone)]
pub struct JsonTraceSink {
    sink: Arc<dyn LogSink>,
}

impl JsonTraceSink {
    /// Create a trace sink backed by the provided line sink.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }
}

impl TraceSinkPort for JsonTraceSink {
    fn track_trace(&self, text: &str, properties: Option<&MessageProperties>) -> Result<()> {
        let line = event_line(TRACE_EVENT, text, properties);
        self.sink.write_line(&line).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::trace_emit_failed(),
                format!("failed to emit trace: {error}"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_sink::MemoryLogSink;
    use serde_json::Value;
    use std::error::Error;
    use std::io;

    #[test]
    fn writes_one_line_per_trace() -> std::result::Result<(), Box<dyn Error>> {
        let lines = Arc::new(MemoryLogSink::new());
        let sink = JsonTraceSink::new(lines.clone());

        sink.track_trace("AI: first", None)?;
        let mut properties = MessageProperties::new();
        properties.insert("exception".to_string(), "boom".to_string());
        sink.track_trace("AI (Internal): second", Some(&properties))?;

        let captured = lines.take();
        assert_eq!(captured.len(), 2);
        let second: Value = serde_json::from_str(captured.get(1).ok_or("missing line")?.trim())?;
        assert_eq!(second.get("event"), Some(&Value::String(TRACE_EVENT.to_string())));
        assert!(second.get("properties").is_some());
        Ok(())
    }

    struct BrokenSink;

    impl LogSink for BrokenSink {
        fn write_line(&self, _line: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn write_failures_map_to_trace_code() -> std::result::Result<(), Box<dyn Error>> {
        let sink = JsonTraceSink::new(Arc::new(BrokenSink));
        let error = sink
            .track_trace("AI: lost", None)
            .err()
            .ok_or("expected trace failure")?;
        assert_eq!(error.code, ErrorCode::trace_emit_failed());
        Ok(())
    }
}
