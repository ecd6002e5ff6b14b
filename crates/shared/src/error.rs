use serde_json::Value;

/// Extracts a human-readable message from a raw error body.
///
/// Accepts a JSON string, a JSON object carrying `message`, or non-empty
/// plain text. Anything else (empty bodies, other JSON shapes) yields `None`.
pub fn message_from_body(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::String(message)) => non_empty(message),
        Ok(Value::Object(fields)) => match fields.get("message") {
            Some(Value::String(message)) => non_empty(message.clone()),
            _ => None,
        },
        Ok(_) => None,
        Err(_) => non_empty(trimmed.to_string()),
    }
}

fn non_empty(message: String) -> Option<String> {
    if message.trim().is_empty() {
        None
    } else {
        Some(message)
    }
}
