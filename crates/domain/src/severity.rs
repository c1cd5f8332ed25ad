//! Severity tiers and actionability classes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix applied to messages meant for the subscribing user.
pub const USER_ACTIONABLE_PREFIX: &str = "AI: ";

/// Prefix applied to messages meant for internal debugging only.
pub const NON_USER_ACTIONABLE_PREFIX: &str = "AI (Internal): ";

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    /// Always eligible for recording.
    Critical,
    /// Recorded only while verbose logging is enabled.
    Warning,
}

impl Severity {
    /// Returns true when a message of this severity should be queued under the
    /// given verbosity.
    #[must_use]
    pub const fn is_recordable(self, verbose_logging: bool) -> bool {
        matches!(self, Self::Critical) || verbose_logging
    }

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Who a diagnostic message is meant for. Selects the text prefix only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Actionability {
    /// The SDK's end user can act on this message.
    UserActionable,
    /// Internal-only diagnostic.
    NonUserActionable,
}

impl Actionability {
    /// Text prefix for this class.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::UserActionable => USER_ACTIONABLE_PREFIX,
            Self::NonUserActionable => NON_USER_ACTIONABLE_PREFIX,
        }
    }
}
