//! Execution tool handlers.

use n8n_mcp_api::{ApiError, N8nClient};
use serde_json::{Value, json};

use super::to_payload;
use crate::server::schemas::{ExecutionIdRequest, ListExecutionsRequest};

pub async fn list_executions(request: &ListExecutionsRequest, client: &N8nClient) -> Result<Value, ApiError> {
    let workflow_id = request.workflow_id.as_deref().map(str::trim).filter(|id| !id.is_empty());
    let executions = client.list_executions(workflow_id, request.limit).await?;
    Ok(json!({
        "count": executions.len(),
        "executions": to_payload("failed to list executions", &executions)?,
    }))
}

pub async fn get_execution(request: &ExecutionIdRequest, client: &N8nClient) -> Result<Value, ApiError> {
    let execution = client.get_execution(&request.execution_id).await?;
    to_payload("failed to get execution", &execution)
}

pub async fn delete_execution(request: &ExecutionIdRequest, client: &N8nClient) -> Result<Value, ApiError> {
    client.delete_execution(&request.execution_id).await?;
    Ok(json!({ "deleted": true, "execution_id": request.execution_id }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use n8n_mcp_api::ConnectionSettings;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> N8nClient {
        let url = format!("{}/api/v1", server.uri());
        let settings = ConnectionSettings::from_lookup(|name| match name {
            "N8N_API_URL" => Some(url.clone()),
            "N8N_API_KEY" => Some("test-key".to_string()),
            _ => None,
        })
        .expect("settings");
        N8nClient::new(settings).expect("client")
    }

    #[tokio::test]
    async fn list_forwards_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/executions"))
            .and(query_param("workflowId", "12"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{
                    "id": 301,
                    "workflowId": "12",
                    "mode": "trigger",
                    "startedAt": "2024-05-01T10:00:00.000Z",
                    "stoppedAt": "2024-05-01T10:00:03.000Z",
                    "status": "success"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = ListExecutionsRequest {
            workflow_id: Some("12".to_string()),
            limit: Some(5),
        };
        let result = list_executions(&request, &client_for(&server)).await.expect("executions");
        assert_eq!(result["count"], 1);
        assert_eq!(result["executions"][0]["id"], "301");
        assert_eq!(result["executions"][0]["status"], "success");
    }

    #[tokio::test]
    async fn get_returns_execution_with_error_details() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/executions/77"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "77",
                "workflowId": "12",
                "mode": "manual",
                "startedAt": "2024-05-01T10:00:00.000Z",
                "stoppedAt": "2024-05-01T10:00:01.000Z",
                "status": "error",
                "finished": false,
                "data": {
                    "resultData": {
                        "runData": {},
                        "lastNodeExecuted": "HTTP Request",
                        "error": { "message": "connect ECONNREFUSED" }
                    }
                }
            })))
            .mount(&server)
            .await;

        let request = ExecutionIdRequest {
            execution_id: "77".to_string(),
        };
        let result = get_execution(&request, &client_for(&server)).await.expect("execution");
        assert_eq!(result["status"], "error");
        assert_eq!(result["data"]["resultData"]["lastNodeExecuted"], "HTTP Request");
    }

    #[tokio::test]
    async fn delete_reports_identifier() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/executions/77"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let request = ExecutionIdRequest {
            execution_id: "77".to_string(),
        };
        let result = delete_execution(&request, &client_for(&server)).await.expect("deleted");
        assert_eq!(result["execution_id"], "77");
    }
}
