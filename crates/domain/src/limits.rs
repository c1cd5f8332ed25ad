//! Validated limits for the two rate-limited scopes.
//!
//! The throttle limit bounds queued diagnostics per page view; the report
//! limit bounds loss reports per session. Both must be non-zero.

use insights_diag_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Default per-page-view throttle limit.
pub const DEFAULT_THROTTLE_LIMIT: u32 = 25;

/// Default per-session loss report limit.
pub const DEFAULT_REPORT_LIMIT: u32 = 10;

/// Limit validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitError {
    /// Throttle limit was zero.
    ZeroThrottleLimit,
    /// Report limit was zero.
    ZeroReportLimit,
}

impl fmt::Display for LimitError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroThrottleLimit => formatter.write_str("throttle limit must be greater than 0"),
            Self::ZeroReportLimit => formatter.write_str("report limit must be greater than 0"),
        }
    }
}

impl std::error::Error for LimitError {}

impl From<LimitError> for ErrorEnvelope {
    fn from(error: LimitError) -> Self {
        let field = match error {
            LimitError::ZeroThrottleLimit => "throttleLimit",
            LimitError::ZeroReportLimit => "reportLimit",
        };
        Self::expected(ErrorCode::invalid_argument(), error.to_string())
            .with_metadata("field", field)
    }
}

/// Maximum number of diagnostics queued per page view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ThrottleLimit(NonZeroU32);

impl ThrottleLimit {
    /// Validate a raw limit.
    pub const fn new(limit: u32) -> Result<Self, LimitError> {
        match NonZeroU32::new(limit) {
            Some(value) => Ok(Self(value)),
            None => Err(LimitError::ZeroThrottleLimit),
        }
    }

    /// Raw limit value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for ThrottleLimit {
    fn default() -> Self {
        Self(NonZeroU32::MIN.saturating_add(DEFAULT_THROTTLE_LIMIT - 1))
    }
}

impl TryFrom<u32> for ThrottleLimit {
    type Error = LimitError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ThrottleLimit> for u32 {
    fn from(limit: ThrottleLimit) -> Self {
        limit.get()
    }
}

/// Maximum number of loss reports emitted per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ReportLimit(NonZeroU32);

impl ReportLimit {
    /// Validate a raw limit.
    pub const fn new(limit: u32) -> Result<Self, LimitError> {
        match NonZeroU32::new(limit) {
            Some(value) => Ok(Self(value)),
            None => Err(LimitError::ZeroReportLimit),
        }
    }

    /// Raw limit value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Returns true while `reported` is still below the limit.
    #[must_use]
    pub fn allows(self, reported: u64) -> bool {
        reported < u64::from(self.get())
    }
}

impl Default for ReportLimit {
    fn default() -> Self {
        Self(NonZeroU32::MIN.saturating_add(DEFAULT_REPORT_LIMIT - 1))
    }
}

impl TryFrom<u32> for ReportLimit {
    type Error = LimitError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ReportLimit> for u32 {
    fn from(limit: ReportLimit) -> Self {
        limit.get()
    }
}
