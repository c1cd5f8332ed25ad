//! Session-scoped key/value storage boundary contract.

use insights_diag_shared::Result;

/// Boundary contract for session-scoped storage.
///
/// Values are short decimal strings. A backend that reports itself as
/// unavailable disables the loss ledger entirely.
pub trait SessionStoragePort: Send + Sync {
    /// Read `key`. `Ok(None)` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Returns false when the backend exists but cannot be used.
    fn is_available(&self) -> bool {
        true
    }
}
