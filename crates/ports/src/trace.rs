//! Drain target boundary contract.

use insights_diag_domain::MessageProperties;
use insights_diag_shared::Result;

/// Boundary contract for the host telemetry stream drained messages go to.
pub trait TraceSinkPort: Send + Sync {
    /// Emit one trace. `properties` is `Some` only when non-empty.
    fn track_trace(&self, text: &str, properties: Option<&MessageProperties>) -> Result<()>;
}
