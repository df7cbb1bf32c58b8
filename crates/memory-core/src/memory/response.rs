//! ============================================================================
//! Response Parsing - Error messages and permissive result extraction
//! ============================================================================
//! Pure functions over raw vector store response bodies.
//! ============================================================================

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// One way of pulling a human-readable message out of an error body
type ExtractStrategy = fn(&Value) -> Option<String>;

/// Tried in order; the first that yields a message wins
const STRATEGIES: &[ExtractStrategy] = &[nested_error_message, nested_status_error, raw_body];

/// `{"error": {"message": "..."}}` or `{"error": "..."}`
fn nested_error_message(body: &Value) -> Option<String> {
    match body.get("error")? {
        Value::String(s) => Some(s.clone()),
        error => error.get("message")?.as_str().map(str::to_string),
    }
}

/// `{"status": {"error": "..."}}` (Qdrant's error envelope)
fn nested_status_error(body: &Value) -> Option<String> {
    body.get("status")?
        .get("error")?
        .as_str()
        .map(str::to_string)
}

fn raw_body(body: &Value) -> Option<String> {
    Some(body.to_string())
}

/// Extract the best error message from a non-success response body.
///
/// Falls back to `status_text` when the body is not JSON.
pub fn extract_error_message(body: &str, status_text: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<Value>(body) else {
        return status_text.to_string();
    };

    STRATEGIES
        .iter()
        .find_map(|strategy| strategy(&parsed))
        .unwrap_or_else(|| status_text.to_string())
}

/// Whether an error message says the collection only has named vectors
pub fn requires_vector_name(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("vector name")
        && (lower.contains("require") || lower.contains("specif") || lower.contains("available"))
}

/// Suffix appended when a search without a vector name hit a named-vector collection
pub const VECTOR_NAME_HINT: &str =
    "(hint: this collection uses named vectors, retry with vector_name \"dense\" or \"sparse\")";

/// Parse `result` (or `result.<field>`) of a success body as a list of `T`.
///
/// A missing field, a non-array value, or an unparseable body yields an empty
/// list; malformed items are skipped.
pub fn result_items<T: DeserializeOwned>(body: &str, field: Option<&str>) -> Vec<T> {
    let parsed: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            warn!("Vector store returned a non-JSON success body: {}", e);
            return Vec::new();
        }
    };

    let mut node = parsed.get("result");
    if let Some(field) = field {
        node = node.and_then(|r| r.get(field));
    }

    let Some(Value::Array(items)) = node else {
        warn!("Vector store response has no result list, treating as empty");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Skipping malformed result item: {}", e);
                None
            }
        })
        .collect()
}
