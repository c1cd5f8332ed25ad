//! Diagnostic message value type.

use crate::severity::Actionability;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form string properties attached to a diagnostic message.
pub type MessageProperties = BTreeMap<String, String>;

/// Text of the sentinel queued once the per-page-view throttle limit is hit.
pub const THROTTLE_SENTINEL_TEXT: &str =
    "AI (Internal): Internal events throttle limit per PageView reached for this app.";

/// A single internal diagnostic message.
///
/// Callers build one and hand it to the diagnostic log by value; the log
/// prefixes its own copy, so the caller's original stays untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    /// Message text.
    pub text: String,
    /// Attached properties. Empty, never absent.
    #[serde(default)]
    pub properties: MessageProperties,
}

impl DiagnosticMessage {
    /// Build a message with no properties.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            properties: MessageProperties::new(),
        }
    }

    /// Build a message with the given properties.
    pub fn with_properties(text: impl Into<String>, properties: MessageProperties) -> Self {
        Self {
            text: text.into(),
            properties,
        }
    }

    /// Attach a single property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// The sentinel message signalling that throttling kicked in.
    #[must_use]
    pub fn throttle_sentinel() -> Self {
        Self::new(THROTTLE_SENTINEL_TEXT)
    }

    /// Returns true when the message carries at least one property.
    #[must_use]
    pub fn has_properties(&self) -> bool {
        !self.properties.is_empty()
    }

    /// Prepend the actionability prefix to the text.
    #[must_use]
    pub fn prefixed(mut self, actionability: Actionability) -> Self {
        self.text.insert_str(0, actionability.prefix());
        self
    }

    /// Render the line written to the host console.
    ///
    /// Plain text when there are no properties, otherwise the JSON form of the
    /// whole message.
    #[must_use]
    pub fn console_line(&self) -> String {
        if !self.has_properties() {
            return self.text.clone();
        }
        serde_json::to_string(self).unwrap_or_else(|_| self.text.clone())
    }
}

impl From<&str> for DiagnosticMessage {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for DiagnosticMessage {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}
