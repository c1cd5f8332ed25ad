//! Loss ledger keys and persisted counter codec.
//!
//! Counters are stored as plain decimal strings under two fixed keys. Anything
//! absent or unparsable reads back as zero.

use crate::severity::NON_USER_ACTIONABLE_PREFIX;
use std::fmt;

/// Fixed session-storage keys used by the loss ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerKey {
    /// Items believed enqueued for send but not yet confirmed.
    ItemsQueued,
    /// Loss reports already emitted this session.
    IssuesReported,
}

impl LedgerKey {
    /// Both keys, in a stable order.
    pub const ALL: [Self; 2] = [Self::ItemsQueued, Self::IssuesReported];

    /// Storage key string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ItemsQueued => "AI_internal_items_queued",
            Self::IssuesReported => "AI_internal_issues_reported",
        }
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Decode a persisted counter. Absent, negative, or garbage values read as 0.
#[must_use]
pub fn parse_counter(raw: Option<&str>) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

/// Encode a counter for persistence.
#[must_use]
pub fn format_counter(value: u64) -> String {
    value.to_string()
}

/// Body of the loss report emitted through the reporter.
#[must_use]
pub fn loss_report_text(lost_items: u64) -> String {
    format!(
        "{NON_USER_ACTIONABLE_PREFIX}Internal report DiagnosticLog: {lost_items} telemetry item(s) were enqueued but never confirmed sent."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn keys_are_distinct() {
        assert_ne!(
            LedgerKey::ItemsQueued.as_str(),
            LedgerKey::IssuesReported.as_str()
        );
    }

    #[test]
    fn parse_counter_defaults_to_zero() {
        assert_eq!(parse_counter(None), 0);
        assert_eq!(parse_counter(Some("")), 0);
        assert_eq!(parse_counter(Some("abc")), 0);
        assert_eq!(parse_counter(Some("-4")), 0);
        assert_eq!(parse_counter(Some("1.5")), 0);
    }

    #[test]
    fn parse_counter_accepts_decimal() {
        assert_eq!(parse_counter(Some("42")), 42);
        assert_eq!(parse_counter(Some(" 7 ")), 7);
    }

    #[test]
    fn report_text_mentions_count() {
        let text = loss_report_text(12);
        assert!(text.starts_with("AI (Internal): "));
        assert!(text.contains("12 telemetry item(s)"));
    }

    proptest! {
        #[test]
        fn counter_codec_round_trips(value in any::<u64>()) {
            prop_assert_eq!(parse_counter(Some(&format_counter(value))), value);
        }
    }
}
