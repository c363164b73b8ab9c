//! Tool request payload types.
//!
//! Each struct is the JSON input schema advertised for one or more tools.

use n8n_mcp_types::{WorkflowConnections, WorkflowNode, WorkflowPatch, WorkflowSettings};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Largest page size the platform accepts for execution listings.
pub const MAX_EXECUTION_LIMIT: u32 = 250;

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ListWorkflowsRequest {
    #[schemars(description = "When true, only active workflows are returned. Defaults to false.")]
    #[serde(default)]
    pub active_only: Option<bool>,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorkflowIdRequest {
    #[schemars(description = "Workflow identifier as returned by list_workflows.")]
    pub workflow_id: String,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CreateWorkflowRequest {
    #[schemars(description = "Display name of the new workflow.")]
    pub name: String,
    #[schemars(description = "Node definitions. Each node needs name, type, typeVersion and position.")]
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[schemars(description = "Connection graph keyed by source node name, then output port (usually 'main').")]
    #[serde(default)]
    pub connections: Option<WorkflowConnections>,
    #[schemars(description = "Optional workflow settings such as executionOrder or timezone.")]
    #[serde(default)]
    pub settings: Option<WorkflowSettings>,
}

impl CreateWorkflowRequest {
    /// Body sent to the platform. Missing graph parts default to empty values.
    pub fn to_patch(&self) -> WorkflowPatch {
        WorkflowPatch {
            name: Some(self.name.clone()),
            nodes: Some(self.nodes.clone()),
            connections: Some(self.connections.clone().unwrap_or_default()),
            settings: Some(self.settings.clone().unwrap_or_default()),
            ..Default::default()
        }
    }
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UpdateWorkflowRequest {
    #[schemars(description = "Workflow identifier to update.")]
    pub workflow_id: String,
    #[schemars(description = "New display name.")]
    #[serde(default)]
    pub name: Option<String>,
    #[schemars(description = "Replacement node list.")]
    #[serde(default)]
    pub nodes: Option<Vec<WorkflowNode>>,
    #[schemars(description = "Replacement connection graph.")]
    #[serde(default)]
    pub connections: Option<WorkflowConnections>,
    #[schemars(description = "Replacement workflow settings.")]
    #[serde(default)]
    pub settings: Option<WorkflowSettings>,
}

impl UpdateWorkflowRequest {
    pub fn to_patch(&self) -> WorkflowPatch {
        WorkflowPatch {
            name: self.name.clone(),
            nodes: self.nodes.clone(),
            connections: self.connections.clone(),
            settings: self.settings.clone(),
            ..Default::default()
        }
    }
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ActivateWorkflowRequest {
    #[schemars(description = "Workflow identifier.")]
    pub workflow_id: String,
    #[schemars(description = "true to activate, false to deactivate. Defaults to true.")]
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExecuteWorkflowRequest {
    #[schemars(description = "Workflow identifier to run.")]
    pub workflow_id: String,
    #[schemars(description = "Optional JSON payload sent as the execution request body.")]
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ListExecutionsRequest {
    #[schemars(description = "Only list executions of this workflow.")]
    #[serde(default)]
    pub workflow_id: Option<String>,
    #[schemars(description = "Maximum number of executions to return (1-250).")]
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExecutionIdRequest {
    #[schemars(description = "Execution identifier as returned by list_executions or execute_workflow.")]
    pub execution_id: String,
}
