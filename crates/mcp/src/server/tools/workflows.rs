//! Workflow tool handlers.

use n8n_mcp_api::{ApiError, N8nClient};
use serde_json::{Value, json};

use super::to_payload;
use crate::server::schemas::{
    ActivateWorkflowRequest, CreateWorkflowRequest, ExecuteWorkflowRequest, ListWorkflowsRequest, UpdateWorkflowRequest,
    WorkflowIdRequest,
};

pub async fn list_workflows(request: &ListWorkflowsRequest, client: &N8nClient) -> Result<Value, ApiError> {
    let mut workflows = client.list_workflows().await?;
    if request.active_only.unwrap_or(false) {
        workflows.retain(|workflow| workflow.active);
    }
    Ok(json!({
        "count": workflows.len(),
        "workflows": to_payload("failed to list workflows", &workflows)?,
    }))
}

pub async fn get_workflow(request: &WorkflowIdRequest, client: &N8nClient) -> Result<Value, ApiError> {
    let workflow = client.get_workflow(&request.workflow_id).await?;
    to_payload("failed to get workflow", &workflow)
}

pub async fn create_workflow(request: &CreateWorkflowRequest, client: &N8nClient) -> Result<Value, ApiError> {
    let workflow = client.create_workflow(&request.to_patch()).await?;
    to_payload("failed to create workflow", &workflow)
}

pub async fn update_workflow(request: &UpdateWorkflowRequest, client: &N8nClient) -> Result<Value, ApiError> {
    let workflow = client.update_workflow(&request.workflow_id, &request.to_patch()).await?;
    to_payload("failed to update workflow", &workflow)
}

pub async fn delete_workflow(request: &WorkflowIdRequest, client: &N8nClient) -> Result<Value, ApiError> {
    client.delete_workflow(&request.workflow_id).await?;
    Ok(json!({ "deleted": true, "workflow_id": request.workflow_id }))
}

pub async fn activate_workflow(request: &ActivateWorkflowRequest, client: &N8nClient) -> Result<Value, ApiError> {
    let active = request.active.unwrap_or(true);
    let workflow = client.toggle_workflow(&request.workflow_id, active).await?;
    let state = if workflow.active { "activated" } else { "deactivated" };
    Ok(json!({
        "success": true,
        "workflow_id": workflow.id,
        "name": workflow.name,
        "active": workflow.active,
        "message": format!("Workflow {} {state}", workflow.id),
    }))
}

pub async fn execute_workflow(request: &ExecuteWorkflowRequest, client: &N8nClient) -> Result<Value, ApiError> {
    let execution = client.execute_workflow(&request.workflow_id, request.data.as_ref()).await?;
    to_payload("failed to execute workflow", &execution)
}
