//! Helpers for building tool-call log payloads.
//!
//! Every payload is passed through the sanitizer before it reaches a log line.
//! Oversized responses (full workflows, execution run data) are summarized
//! rather than dumped.

use n8n_mcp_util::{redact_json, sanitize_value};
use serde_json::{Map, Value, json};
use tracing::debug;

const MAX_LOGGED_RESPONSE_BYTES: usize = 64 * 1024;

/// Builds the sanitized log payload for a tool call.
///
/// The payload includes `request` and/or `response` when present. Returns
/// `None` when both values are absent.
pub(crate) fn build_log_payload(request: Option<&Value>, response: Option<&Value>) -> Option<Value> {
    let mut payload = Map::new();
    if let Some(request_value) = request {
        payload.insert("request".to_string(), scrub(request_value));
    }
    if let Some(response_value) = response {
        payload.insert("response".to_string(), bounded_response(scrub(response_value)));
    }
    if payload.is_empty() { None } else { Some(Value::Object(payload)) }
}

/// Emit the sanitized request/response pair for `tool` at debug level.
pub(crate) fn log_tool_payload(tool: &str, request: Option<&Value>, response: Option<&Value>) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    if let Some(payload) = build_log_payload(request, response) {
        debug!(tool, payload = %payload, "tool payload");
    }
}

/// Key-based redaction first, then free-text secrets inside string leaves.
fn scrub(value: &Value) -> Value {
    redact_json(&sanitize_value(value))
}

fn bounded_response(response: Value) -> Value {
    let size = serde_json::to_vec(&response).map(|bytes| bytes.len()).unwrap_or(0);
    if size <= MAX_LOGGED_RESPONSE_BYTES {
        return response;
    }
    json!({
        "truncated": true,
        "bytes": size,
        "keys": top_level_keys(&response),
    })
}

fn top_level_keys(value: &Value) -> Vec<String> {
    match value {
        Value::Object(map) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_secrets_in_both_halves() {
        let request = json!({ "workflow_id": "1", "data": { "apiKey": "abc" } });
        let response = json!({ "credentials": [{ "name": "Slack", "token": "xoxb" }] });
        let payload = build_log_payload(Some(&request), Some(&response)).expect("payload");
        assert_eq!(payload["request"]["data"]["apiKey"], "[REDACTED]");
        assert_eq!(payload["response"]["credentials"][0]["token"], "[REDACTED]");
        assert_eq!(payload["response"]["credentials"][0]["name"], "Slack");
    }

    #[test]
    fn redacts_secrets_inside_failure_messages() {
        let failure = json!({ "error": "failed to get workflow wf-1: upstream rejected password=hunter2", "kind": "remote_message" });
        let payload = build_log_payload(None, Some(&failure)).expect("payload");
        let message = payload["response"]["error"].as_str().expect("message");
        assert!(!message.contains("hunter2"));
        assert!(message.starts_with("failed to get workflow wf-1"));
        assert_eq!(payload["response"]["kind"], "remote_message");
    }

    #[test]
    fn empty_payload_is_none() {
        assert!(build_log_payload(None, None).is_none());
    }

    #[test]
    fn oversized_response_is_summarized() {
        let response = json!({ "workflow": "x".repeat(MAX_LOGGED_RESPONSE_BYTES + 1), "count": 1 });
        let payload = build_log_payload(None, Some(&response)).expect("payload");
        assert_eq!(payload["response"]["truncated"], true);
        let keys = payload["response"]["keys"].as_array().expect("keys");
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&json!("workflow")));
    }
}
