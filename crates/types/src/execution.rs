//! Execution records returned by the `/executions` endpoints.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How an execution was started.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Manual,
    Trigger,
    Webhook,
    Retry,
    /// Any mode this crate does not recognize (for example `integrated` or `cli`).
    #[serde(other)]
    Other,
}

/// Lifecycle state of an execution.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Success,
    Error,
    Waiting,
    Canceled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ExecutionStatus {
    /// Whether the execution has reached a final state.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Success | Self::Error | Self::Canceled)
    }
}

/// A full execution record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    #[serde(deserialize_with = "crate::deserialize_identifier")]
    pub id: String,
    /// Identifier of the workflow that ran.
    #[serde(deserialize_with = "crate::deserialize_identifier")]
    pub workflow_id: String,
    pub mode: ExecutionMode,
    /// Unset while the execution is queued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Unset while the execution is still running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished: Option<bool>,
    /// Run data, only present when the platform was asked to include it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ExecutionData>,
    /// Execution this one retried, if any.
    #[serde(
        default,
        deserialize_with = "crate::deserialize_optional_identifier",
        skip_serializing_if = "Option::is_none"
    )]
    pub retry_of: Option<String>,
    #[serde(
        default,
        deserialize_with = "crate::deserialize_optional_identifier",
        skip_serializing_if = "Option::is_none"
    )]
    pub retry_success_id: Option<String>,
    /// Resume time for executions parked in a wait node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_till: Option<DateTime<Utc>>,
}

/// Execution projection returned by `GET /executions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionListItem {
    #[serde(deserialize_with = "crate::deserialize_identifier")]
    pub id: String,
    #[serde(deserialize_with = "crate::deserialize_identifier")]
    pub workflow_id: String,
    pub mode: ExecutionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionData {
    pub result_data: ExecutionResultData,
    /// Engine bookkeeping, passed through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_data: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResultData {
    /// Per-node run output keyed by node name.
    #[serde(default)]
    pub run_data: IndexMap<String, Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_node_executed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ExecutionError>,
}

/// Error captured for a failed execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Failing node. The platform sends either a name or the full node object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn execution_with_numeric_id_and_error_data() {
        let execution: Execution = serde_json::from_value(json!({
            "id": 1042,
            "workflowId": "wf-1",
            "mode": "webhook",
            "startedAt": "2024-03-01T12:00:00.000Z",
            "stoppedAt": "2024-03-01T12:00:02.500Z",
            "status": "error",
            "finished": false,
            "retryOf": null,
            "data": {
                "resultData": {
                    "runData": { "Webhook": [{ "startTime": 1 }] },
                    "lastNodeExecuted": "HTTP Request",
                    "error": { "message": "connect ECONNREFUSED", "name": "NodeApiError", "node": { "name": "HTTP Request" } }
                }
            }
        }))
        .expect("execution");

        assert_eq!(execution.id, "1042");
        assert_eq!(execution.mode, ExecutionMode::Webhook);
        assert_eq!(execution.status, ExecutionStatus::Error);
        assert!(execution.status.is_finished());
        assert!(execution.retry_of.is_none());
        let result = &execution.data.as_ref().expect("data").result_data;
        assert_eq!(result.last_node_executed.as_deref(), Some("HTTP Request"));
        assert_eq!(result.error.as_ref().map(|error| error.message.as_str()), Some("connect ECONNREFUSED"));
    }

    #[test]
    fn unknown_mode_and_missing_status_fall_back() {
        let item: ExecutionListItem = serde_json::from_value(json!({
            "id": "9",
            "workflowId": 3,
            "mode": "integrated",
            "startedAt": "2024-03-01T12:00:00Z"
        }))
        .expect("list item");

        assert_eq!(item.workflow_id, "3");
        assert_eq!(item.mode, ExecutionMode::Other);
        assert_eq!(item.status, ExecutionStatus::Unknown);
        assert!(item.stopped_at.is_none());
        assert!(!item.status.is_finished());
    }

    #[test]
    fn queued_execution_has_no_start_time() {
        let items: Vec<ExecutionListItem> = serde_json::from_value(json!([
            { "id": "11", "workflowId": "wf-1", "mode": "trigger", "startedAt": null, "status": "new" },
            { "id": "10", "workflowId": "wf-1", "mode": "trigger", "startedAt": "2024-03-01T12:00:00Z", "status": "success" }
        ]))
        .expect("list items");

        assert!(items[0].started_at.is_none());
        assert_eq!(items[0].status, ExecutionStatus::Unknown);
        assert!(items[1].started_at.is_some());
        let encoded = serde_json::to_value(&items[0]).expect("encode");
        assert!(encoded.get("startedAt").is_none());
    }

    #[test]
    fn running_execution_has_no_stop_time() {
        let execution: Execution = serde_json::from_value(json!({
            "id": "5",
            "workflowId": "wf-2",
            "mode": "manual",
            "startedAt": "2024-03-01T12:00:00Z",
            "status": "running"
        }))
        .expect("execution");
        assert_eq!(execution.status, ExecutionStatus::Running);
        let encoded = serde_json::to_value(&execution).expect("encode");
        assert!(encoded.get("stoppedAt").is_none());
        assert_eq!(encoded["status"], "running");
    }
}
