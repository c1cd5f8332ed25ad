//! Secret detection and redaction utilities.
//!
//! Diagnostic message properties are free-form and come from every corner of
//! the SDK, so anything that leaves the process (trace sinks, console lines)
//! passes its keys through [`is_secret_key`] first.

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";

/// Checks if a property key likely refers to a secret.
///
/// Matching is case-insensitive and looks for common secret naming patterns.
///
/// # Examples
///
/// ```
/// use insights_diag_shared::is_secret_key;
///
/// assert!(is_secret_key("instrumentationKey"));
/// assert!(is_secret_key("authToken"));
/// assert!(!is_secret_key("itemsQueued"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    key.contains("KEY")
        || key.contains("TOKEN")
        || key.contains("SECRET")
        || key.contains("PASSWORD")
        || key.contains("CREDENTIAL")
        || key.contains("AUTH")
        || key.contains("CONNECTIONSTRING")
}

/// Redacts a value if the key is likely a secret.
///
/// # Examples
///
/// ```
/// use insights_diag_shared::redact_if_secret;
///
/// assert_eq!(redact_if_secret("instrumentationKey", "abc-123"), "[REDACTED]");
/// assert_eq!(redact_if_secret("severity", "critical"), "critical");
/// ```
pub fn redact_if_secret(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}
