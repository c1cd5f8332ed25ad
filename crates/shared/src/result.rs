//! Result helpers for shared error handling.

use crate::errors::ErrorEnvelope;

/// Shared result type used across the workspace.
pub type Result<T, E = ErrorEnvelope> = std::result::Result<T, E>;

/// Extension helpers for fail-open call sites.
///
/// Diagnostics code must never surface collaborator failures to the host, but
/// silently dropping them makes the discard impossible to audit. These helpers
/// hand the error to an observer first and only then throw it away.
pub trait ResultExt<T, E> {
    /// Map the success value, preserving the error.
    fn map_ok<U, F>(self, op: F) -> Result<U, E>
    where
        F: FnOnce(T) -> U;

    /// Hand the error to `observer` and convert the result into an `Option`.
    fn discard_err<F>(self, observer: F) -> Option<T>
    where
        F: FnOnce(E);

    /// Hand the error to `observer` and fall back to `default`.
    fn unwrap_or_observe<F>(self, default: T, observer: F) -> T
    where
        F: FnOnce(E);
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn map_ok<U, F>(self, op: F) -> Result<U, E>
    where
        F: FnOnce(T) -> U,
    {
        self.map(op)
    }

    fn discard_err<F>(self, observer: F) -> Option<T>
    where
        F: FnOnce(E),
    {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                observer(error);
                None
            },
        }
    }

    fn unwrap_or_observe<F>(self, default: T, observer: F) -> T
    where
        F: FnOnce(E),
    {
        self.discard_err(observer).unwrap_or(default)
    }
}
