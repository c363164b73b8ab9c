//! Shared n8n resource types.
//!
//! Every type here is an immutable snapshot of a remote resource as returned by a
//! single API call. Field names follow the platform's camelCase wire format, and
//! payloads the platform treats as free-form (node parameters, static data,
//! execution context) are kept as opaque [`serde_json::Value`]s so they pass
//! through untouched.

pub mod credential;
pub mod execution;
pub mod workflow;

pub use credential::{Credential, Tag};
pub use execution::{Execution, ExecutionData, ExecutionError, ExecutionListItem, ExecutionMode, ExecutionResultData, ExecutionStatus};
pub use workflow::{
    ConnectionTarget, NodeConnections, Workflow, WorkflowConnections, WorkflowListItem, WorkflowNode, WorkflowPatch, WorkflowSettings,
};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Envelope used by every list endpoint: `{ "data": [...], "nextCursor": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListEnvelope<T> {
    /// Items on the current page.
    pub data: Vec<T>,
    /// Pagination cursor for the next page, when the platform reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Accept identifiers encoded either as JSON strings or integers.
///
/// Older platform versions emit numeric ids for workflows and executions.
pub(crate) fn deserialize_identifier<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!("expected string or integer identifier, got {other}"))),
    }
}

pub(crate) fn deserialize_optional_identifier<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!("expected string or integer identifier, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_envelope_reads_cursor() {
        let envelope: ListEnvelope<Tag> = serde_json::from_value(json!({
            "data": [{ "id": "1", "name": "ops" }],
            "nextCursor": "abc"
        }))
        .expect("envelope");
        assert_eq!(envelope.data.len(), 1);
        assert_eq!(envelope.next_cursor.as_deref(), Some("abc"));
    }

    #[test]
    fn list_envelope_without_cursor() {
        let envelope: ListEnvelope<Tag> = serde_json::from_value(json!({ "data": [] })).expect("envelope");
        assert!(envelope.data.is_empty());
        assert!(envelope.next_cursor.is_none());
    }
}
