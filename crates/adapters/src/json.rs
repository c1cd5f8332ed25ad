//! JSON line encoding shared by the reporter and trace adapters.

use insights_diag_domain::MessageProperties;
use insights_diag_shared::{REDACTED, is_secret_key};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Encode one event as a JSON line with a trailing newline.
pub(crate) fn event_line(event: &str, message: &str, properties: Option<&MessageProperties>) -> String {
    let mut payload = serde_json::Map::new();
    payload.insert("timestampMs".to_string(), Value::from(now_epoch_ms()));
    payload.insert("event".to_string(), Value::String(event.to_string()));
    payload.insert("message".to_string(), Value::String(message.to_string()));
    if let Some(properties) = properties.filter(|properties| !properties.is_empty()) {
        payload.insert("properties".to_string(), redacted_properties(properties));
    }

    serde_json::to_string(&Value::Object(payload)).map_or_else(
        |_| {
            "{\"timestampMs\":0,\"event\":\"adapter.serialize_failed\",\"message\":\"event serialization failed\"}\n"
                .to_string()
        },
        |mut encoded| {
            encoded.push('\n');
            encoded
        },
    )
}

fn redacted_properties(properties: &MessageProperties) -> Value {
    let map = properties
        .iter()
        .map(|(key, value)| {
            let value = if is_secret_key(key) {
                REDACTED.to_string()
            } else {
                value.clone()
            };
            (key.clone(), Value::String(value))
        })
        .collect();
    Value::Object(map)
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|duration| u64::try_from(duration.as_millis()).ok())
        .unwrap_or_default()
}
