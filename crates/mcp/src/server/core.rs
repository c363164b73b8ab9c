use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use n8n_mcp_api::{ApiError, N8nClient};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, ErrorData, ErrorData as McpError, Implementation, ListResourceTemplatesResult, ListResourcesResult,
    PaginatedRequestParams, ProtocolVersion, ReadResourceRequestParams, ReadResourceResult, ServerCapabilities, ServerInfo,
};
use rmcp::{ServerHandler, service::RequestContext, tool, tool_handler, tool_router};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::server::errors::{invalid_params_error, require_identifier, tool_failure_payload};
use crate::server::log_payload::log_tool_payload;
use crate::server::resources;
use crate::server::schemas::{
    ActivateWorkflowRequest, CreateWorkflowRequest, ExecuteWorkflowRequest, ExecutionIdRequest, ListExecutionsRequest,
    ListWorkflowsRequest, MAX_EXECUTION_LIMIT, UpdateWorkflowRequest, WorkflowIdRequest,
};
use crate::server::tools::{credentials, executions, workflows};

const SERVER_INSTRUCTIONS: &str = "Tools for an n8n instance.\n\
WORKFLOWS: list_workflows -> get_workflow for the full graph. create_workflow / update_workflow take nodes and connections in n8n's JSON format. activate_workflow arms or disarms triggers.\n\
EXECUTIONS: execute_workflow starts a run; poll get_execution with the returned id. list_executions filters by workflow_id.\n\
RESOURCES: every workflow is readable as n8n://workflow/{id}.\n\
Call health_check first when other tools report connection errors.";

/// MCP handler exposing n8n operations as tools over a shared client.
#[derive(Clone)]
pub struct N8nMcpCore {
    tool_router: ToolRouter<Self>,
    client: Arc<N8nClient>,
}

#[tool_router]
impl N8nMcpCore {
    pub fn new(client: Arc<N8nClient>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            client,
        }
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "List workflows (id, name, active, timestamps, tags). Set active_only=true to skip inactive workflows. Use get_workflow for nodes and connections."
    )]
    async fn list_workflows(&self, param: Parameters<ListWorkflowsRequest>) -> Result<CallToolResult, ErrorData> {
        Ok(self
            .dispatch("list_workflows", &param.0, workflows::list_workflows(&param.0, &self.client))
            .await)
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "Get one workflow by id, including its nodes, connections, settings and tags."
    )]
    async fn get_workflow(&self, param: Parameters<WorkflowIdRequest>) -> Result<CallToolResult, ErrorData> {
        require_identifier("workflow_id", &param.0.workflow_id)?;
        Ok(self
            .dispatch("get_workflow", &param.0, workflows::get_workflow(&param.0, &self.client))
            .await)
    }

    #[tool(description = "Create a workflow from a name, node list and connection graph. The new workflow starts inactive.")]
    async fn create_workflow(&self, param: Parameters<CreateWorkflowRequest>) -> Result<CallToolResult, ErrorData> {
        if param.0.name.trim().is_empty() {
            return Err(invalid_params_error(
                "WORKFLOW_NAME_MISSING",
                "'name' must not be empty",
                json!({ "field": "name" }),
                "Provide a display name for the workflow.",
            ));
        }
        Ok(self
            .dispatch("create_workflow", &param.0, workflows::create_workflow(&param.0, &self.client))
            .await)
    }

    #[tool(
        annotations(idempotent_hint = true),
        description = "Update a workflow. Only the provided fields (name, nodes, connections, settings) are sent; nodes and connections replace the stored ones."
    )]
    async fn update_workflow(&self, param: Parameters<UpdateWorkflowRequest>) -> Result<CallToolResult, ErrorData> {
        require_identifier("workflow_id", &param.0.workflow_id)?;
        Ok(self
            .dispatch("update_workflow", &param.0, workflows::update_workflow(&param.0, &self.client))
            .await)
    }

    #[tool(
        annotations(destructive_hint = true),
        description = "Permanently delete a workflow by id."
    )]
    async fn delete_workflow(&self, param: Parameters<WorkflowIdRequest>) -> Result<CallToolResult, ErrorData> {
        require_identifier("workflow_id", &param.0.workflow_id)?;
        Ok(self
            .dispatch("delete_workflow", &param.0, workflows::delete_workflow(&param.0, &self.client))
            .await)
    }

    #[tool(
        annotations(idempotent_hint = true),
        description = "Activate (active=true, the default) or deactivate (active=false) a workflow's triggers."
    )]
    async fn activate_workflow(&self, param: Parameters<ActivateWorkflowRequest>) -> Result<CallToolResult, ErrorData> {
        require_identifier("workflow_id", &param.0.workflow_id)?;
        Ok(self
            .dispatch("activate_workflow", &param.0, workflows::activate_workflow(&param.0, &self.client))
            .await)
    }

    #[tool(description = "Run a workflow now. Optional data is sent as the request body. Returns the execution record; poll get_execution for the outcome.")]
    async fn execute_workflow(&self, param: Parameters<ExecuteWorkflowRequest>) -> Result<CallToolResult, ErrorData> {
        require_identifier("workflow_id", &param.0.workflow_id)?;
        Ok(self
            .dispatch("execute_workflow", &param.0, workflows::execute_workflow(&param.0, &self.client))
            .await)
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "List recent executions, optionally for one workflow_id and capped by limit (1-250)."
    )]
    async fn list_executions(&self, param: Parameters<ListExecutionsRequest>) -> Result<CallToolResult, ErrorData> {
        if let Some(limit) = param.0.limit
            && !(1..=MAX_EXECUTION_LIMIT).contains(&limit)
        {
            return Err(invalid_params_error(
                "EXECUTION_LIMIT_OUT_OF_RANGE",
                format!("'limit' must be between 1 and {MAX_EXECUTION_LIMIT}, got {limit}"),
                json!({ "field": "limit", "value": limit }),
                "Omit limit or pass a value in range.",
            ));
        }
        Ok(self
            .dispatch("list_executions", &param.0, executions::list_executions(&param.0, &self.client))
            .await)
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "Get one execution by id with its status, timing and per-node result data."
    )]
    async fn get_execution(&self, param: Parameters<ExecutionIdRequest>) -> Result<CallToolResult, ErrorData> {
        require_identifier("execution_id", &param.0.execution_id)?;
        Ok(self
            .dispatch("get_execution", &param.0, executions::get_execution(&param.0, &self.client))
            .await)
    }

    #[tool(
        annotations(destructive_hint = true),
        description = "Permanently delete an execution record by id."
    )]
    async fn delete_execution(&self, param: Parameters<ExecutionIdRequest>) -> Result<CallToolResult, ErrorData> {
        require_identifier("execution_id", &param.0.execution_id)?;
        Ok(self
            .dispatch("delete_execution", &param.0, executions::delete_execution(&param.0, &self.client))
            .await)
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "List credential metadata (id, name, type). Secret values are never returned."
    )]
    async fn list_credentials(&self) -> Result<CallToolResult, ErrorData> {
        Ok(self
            .dispatch("list_credentials", &json!({}), credentials::list_credentials(&self.client))
            .await)
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "Check that the n8n API is reachable with the configured credentials. Returns healthy, latency_ms and base_url."
    )]
    async fn health_check(&self) -> Result<CallToolResult, ErrorData> {
        Ok(self
            .dispatch("health_check", &json!({}), credentials::health_check(&self.client))
            .await)
    }
}

impl N8nMcpCore {
    /// Run one adapter call and package the outcome as a tool result.
    ///
    /// Adapter failures become error results carrying `{error, kind, tool}`
    /// rather than protocol errors.
    async fn dispatch<R, F>(&self, tool: &'static str, request: &R, call: F) -> CallToolResult
    where
        R: Serialize,
        F: Future<Output = Result<Value, ApiError>>,
    {
        info!(tool, "tool call started");
        let started = Instant::now();
        let outcome = call.await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let request_value = serde_json::to_value(request).ok();

        match outcome {
            Ok(payload) => {
                info!(tool, elapsed_ms, "tool call succeeded");
                log_tool_payload(tool, request_value.as_ref(), Some(&payload));
                CallToolResult::structured(payload)
            }
            Err(error) => {
                warn!(tool, elapsed_ms, kind = %error.kind(), error = %error.redacted(), "tool call failed");
                let failure = tool_failure_payload(tool, &error);
                log_tool_payload(tool, request_value.as_ref(), Some(&failure));
                CallToolResult::structured_error(failure)
            }
        }
    }
}

#[tool_handler]
impl ServerHandler for N8nMcpCore {
    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<rmcp::RoleServer>,
    ) -> impl Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        async move { Ok(resources::list_resources(&self.client).await) }
    }

    fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<rmcp::RoleServer>,
    ) -> impl Future<Output = Result<ListResourceTemplatesResult, McpError>> + Send + '_ {
        std::future::ready(Ok(resources::list_resource_templates()))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<rmcp::RoleServer>,
    ) -> impl Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move { resources::read_resource(&request.uri, &self.client).await }
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().enable_resources().build(),
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: "n8n-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("n8n MCP".to_string()),
                ..Default::default()
            },
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
        }
    }
}
