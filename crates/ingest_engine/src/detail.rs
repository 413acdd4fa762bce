use serde_json::Value;

/// Pull the human-readable `detail` out of an error body.
///
/// A body that is not JSON, or carries no usable `detail`, yields `None`.
/// Validation errors arrive as a list of `{ "msg": ... }` objects and are
/// joined into one line.
pub fn parse_error_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let detail = value.get("detail")?;
    let text = match detail {
        Value::String(text) => text.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text.clone()),
                other => other.get("msg").and_then(Value::as_str).map(str::to_owned),
            })
            .collect::<Vec<_>>()
            .join("; "),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}
