//! Test fixtures for shared error codes and envelopes.

use insights_diag_shared::{ErrorCode, ErrorEnvelope};

/// Every subsystem error code, for exhaustive round-trip checks.
pub fn common_error_codes() -> Vec<ErrorCode> {
    vec![
        ErrorCode::invalid_argument(),
        ErrorCode::io(),
        ErrorCode::internal(),
        ErrorCode::storage_unavailable(),
        ErrorCode::storage_write_failed(),
        ErrorCode::storage_corrupt(),
        ErrorCode::reporter_report_failed(),
        ErrorCode::reporter_flush_failed(),
        ErrorCode::trace_emit_failed(),
        ErrorCode::console_write_failed(),
        ErrorCode::diagnostic_raised(),
    ]
}

/// A storage write failure fixture.
pub fn storage_write_error() -> ErrorEnvelope {
    ErrorEnvelope::unexpected(ErrorCode::storage_write_failed(), "quota exceeded")
}

/// A reporter failure fixture.
pub fn reporter_error() -> ErrorEnvelope {
    ErrorEnvelope::unexpected(ErrorCode::reporter_report_failed(), "transport offline")
}

/// An invalid argument fixture.
pub fn invalid_argument_error() -> ErrorEnvelope {
    ErrorEnvelope::expected(ErrorCode::invalid_argument(), "throttle limit must be > 0")
}
