//! Workflow models mirroring the platform's `/workflows` resources.
//!
//! Connection graphs and node lists preserve the order the platform returns them
//! in (via `IndexMap` and `Vec`) so a workflow read and written back is
//! byte-for-byte comparable on every documented attribute.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::Tag;

/// Targets reachable from one node, keyed by output port (usually `main`).
///
/// Each port holds one list per output index; each list contains the targets
/// wired to that output slot.
pub type NodeConnections = IndexMap<String, Vec<Vec<ConnectionTarget>>>;

/// Full connection graph keyed by source node name.
pub type WorkflowConnections = IndexMap<String, NodeConnections>;

/// A complete workflow definition as returned by `GET /workflows/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    /// Platform-assigned workflow identifier.
    #[serde(deserialize_with = "crate::deserialize_identifier")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Whether triggers for this workflow are currently armed.
    pub active: bool,
    /// Ordered node definitions.
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    /// Connection graph between nodes. References node names in `nodes`.
    #[serde(default)]
    pub connections: WorkflowConnections,
    /// Optional workflow-level settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<WorkflowSettings>,
    /// Opaque static data persisted by trigger nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_data: Option<Value>,
    /// Tags attached to the workflow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Workflow projection returned by list endpoints (no nodes or connections).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowListItem {
    #[serde(deserialize_with = "crate::deserialize_identifier")]
    pub id: String,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

impl From<&Workflow> for WorkflowListItem {
    fn from(workflow: &Workflow) -> Self {
        Self {
            id: workflow.id.clone(),
            name: workflow.name.clone(),
            active: workflow.active,
            created_at: workflow.created_at,
            updated_at: workflow.updated_at,
            tags: workflow.tags.clone(),
        }
    }
}

/// A single step within a workflow graph.
#[derive(JsonSchema, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowNode {
    /// Node identifier. Generated by the platform when omitted on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Unique node name within the workflow; used as the key in `connections`.
    pub name: String,
    /// Node type, for example `n8n-nodes-base.httpRequest`.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Version of the node type implementation.
    pub type_version: Number,
    /// Canvas position as `[x, y]`.
    pub position: [f64; 2],
    /// Node parameters, passed through verbatim.
    #[serde(default)]
    pub parameters: Value,
    /// Credential references by credential type, passed through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One edge endpoint in the connection graph.
#[derive(JsonSchema, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionTarget {
    /// Name of the target node.
    pub node: String,
    /// Connection type on the target side (usually `main`).
    #[serde(rename = "type")]
    pub connection_type: String,
    /// Input index on the target node.
    pub index: u32,
}

/// Workflow-level settings.
///
/// Known keys are typed; anything else the platform adds is preserved in `extra`
/// so updates never drop settings this crate does not know about.
#[derive(JsonSchema, Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSettings {
    /// Execution ordering strategy (`v0` or `v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_order: Option<String>,
    /// `all` or `none`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_data_error_execution: Option<String>,
    /// `all` or `none`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_data_success_execution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_manual_executions: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_policy: Option<String>,
    /// Identifier of the workflow run when this one fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_workflow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Execution timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_timeout: Option<i64>,
    /// Unrecognized settings, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Partial workflow used as the body of create and update calls.
///
/// Only fields that are set are serialized, so a patch never clobbers remote
/// state it did not mention.
#[derive(JsonSchema, Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<WorkflowNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<WorkflowConnections>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<WorkflowSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_data: Option<Value>,
}

impl WorkflowPatch {
    /// Patch that only flips the activation flag.
    pub fn activation(active: bool) -> Self {
        Self {
            active: Some(active),
            ..Default::default()
        }
    }

    /// Whether the patch carries no changes at all.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire_workflow() -> Value {
        json!({
            "id": "wf-1",
            "name": "Sync contacts",
            "active": true,
            "nodes": [
                {
                    "id": "a1",
                    "name": "Webhook",
                    "type": "n8n-nodes-base.webhook",
                    "typeVersion": 2,
                    "position": [250.0, 300.0],
                    "parameters": { "path": "contacts", "httpMethod": "POST" },
                    "webhookId": "hook-1"
                },
                {
                    "id": "b2",
                    "name": "HTTP Request",
                    "type": "n8n-nodes-base.httpRequest",
                    "typeVersion": 4.2,
                    "position": [450.0, 300.0],
                    "parameters": { "url": "https://crm.example.com/contacts" },
                    "credentials": { "httpHeaderAuth": { "id": "7", "name": "CRM" } },
                    "disabled": false,
                    "notes": "push to CRM"
                }
            ],
            "connections": {
                "Webhook": { "main": [[{ "node": "HTTP Request", "type": "main", "index": 0 }]] }
            },
            "settings": { "executionOrder": "v1", "timezone": "UTC", "saveDataErrorExecution": "all", "customFlag": 3 },
            "staticData": { "lastId": 42 },
            "tags": [{ "id": "t1", "name": "crm", "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-02T00:00:00Z" }],
            "createdAt": "2024-01-01T10:00:00Z",
            "updatedAt": "2024-02-01T10:00:00Z"
        })
    }

    #[test]
    fn workflow_round_trips_through_wire_json() {
        let workflow: Workflow = serde_json::from_value(wire_workflow()).expect("workflow");
        let encoded = serde_json::to_value(&workflow).expect("encode");
        let decoded: Workflow = serde_json::from_value(encoded).expect("decode");
        assert_eq!(workflow, decoded);
    }

    #[test]
    fn workflow_preserves_documented_attributes() {
        let workflow: Workflow = serde_json::from_value(wire_workflow()).expect("workflow");
        assert_eq!(workflow.id, "wf-1");
        assert_eq!(workflow.nodes.len(), 2);
        assert_eq!(workflow.nodes[1].node_type, "n8n-nodes-base.httpRequest");
        assert_eq!(workflow.nodes[1].type_version.as_f64(), Some(4.2));
        let targets = &workflow.connections["Webhook"]["main"][0];
        assert_eq!(targets[0].node, "HTTP Request");
        assert_eq!(targets[0].index, 0);
        let settings = workflow.settings.as_ref().expect("settings");
        assert_eq!(settings.execution_order.as_deref(), Some("v1"));
        assert_eq!(settings.extra.get("customFlag"), Some(&json!(3)));
        assert_eq!(workflow.static_data, Some(json!({ "lastId": 42 })));
        assert_eq!(workflow.tags.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn numeric_workflow_ids_are_accepted() {
        let mut wire = wire_workflow();
        wire["id"] = json!(17);
        let workflow: Workflow = serde_json::from_value(wire).expect("workflow");
        assert_eq!(workflow.id, "17");
    }

    #[test]
    fn null_static_data_reads_as_none() {
        let mut wire = wire_workflow();
        wire["staticData"] = Value::Null;
        let workflow: Workflow = serde_json::from_value(wire).expect("workflow");
        assert!(workflow.static_data.is_none());
    }

    #[test]
    fn list_item_projection_drops_graph() {
        let workflow: Workflow = serde_json::from_value(wire_workflow()).expect("workflow");
        let item = WorkflowListItem::from(&workflow);
        let encoded = serde_json::to_value(&item).expect("encode");
        assert!(encoded.get("nodes").is_none());
        assert!(encoded.get("connections").is_none());
        assert_eq!(encoded["name"], "Sync contacts");
    }

    #[test]
    fn activation_patch_serializes_only_active() {
        let patch = WorkflowPatch::activation(false);
        assert_eq!(serde_json::to_value(&patch).expect("encode"), json!({ "active": false }));
        assert!(!patch.is_empty());
        assert!(WorkflowPatch::default().is_empty());
    }
}
