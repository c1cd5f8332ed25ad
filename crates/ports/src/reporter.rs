//! Loss reporter boundary contract.

use insights_diag_shared::Result;

/// Boundary contract for emitting loss reports.
///
/// The ledger calls [`report`](Self::report) then [`flush`](Self::flush), each
/// exactly once per emitted report.
pub trait LossReporterPort: Send + Sync {
    /// Submit a loss report message.
    fn report(&self, message: &str) -> Result<()>;

    /// Flush any buffered reports.
    fn flush(&self) -> Result<()>;
}
