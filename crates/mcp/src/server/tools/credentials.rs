//! Credential and connectivity tool handlers.

use std::time::Instant;

use n8n_mcp_api::{ApiError, N8nClient};
use n8n_mcp_util::sanitize_value;
use serde_json::{Value, json};

use super::to_payload;

/// List credential metadata. The payload is sanitized before it leaves the server.
pub async fn list_credentials(client: &N8nClient) -> Result<Value, ApiError> {
    let credentials = client.list_credentials().await?;
    let payload = to_payload("failed to list credentials", &credentials)?;
    Ok(json!({
        "count": credentials.len(),
        "credentials": sanitize_value(&payload),
    }))
}

/// Probe connectivity. Never fails; an unreachable instance reports `healthy: false`.
pub async fn health_check(client: &N8nClient) -> Result<Value, ApiError> {
    let started = Instant::now();
    let healthy = client.health_check().await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    Ok(json!({
        "healthy": healthy,
        "latency_ms": latency_ms,
        "base_url": client.display_base_url(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use n8n_mcp_api::{ApiErrorKind, ConnectionSettings};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_with_url(url: String) -> N8nClient {
        let settings = ConnectionSettings::from_lookup(|name| match name {
            "N8N_API_URL" => Some(url.clone()),
            "N8N_API_KEY" => Some("test-key".to_string()),
            "REQUEST_TIMEOUT" => Some("1000".to_string()),
            _ => None,
        })
        .expect("settings");
        N8nClient::new(settings).expect("client")
    }

    #[tokio::test]
    async fn credentials_are_listed_without_secrets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{
                    "id": "c1",
                    "name": "Slack bot",
                    "type": "slackApi",
                    "createdAt": "2024-05-01T10:00:00.000Z",
                    "updatedAt": "2024-05-01T10:00:00.000Z"
                }]
            })))
            .mount(&server)
            .await;

        let result = list_credentials(&client_with_url(format!("{}/api/v1", server.uri()))).await.expect("credentials");
        assert_eq!(result["count"], 1);
        assert_eq!(result["credentials"][0]["type"], "slackApi");
    }

    #[tokio::test]
    async fn unauthorized_credentials_listing_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/credentials"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let error = list_credentials(&client_with_url(format!("{}/api/v1", server.uri())))
            .await
            .expect_err("unauthorized");
        assert_eq!(error.kind(), ApiErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn health_check_reports_state_and_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/workflows"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        let base_url = format!("{}/api/v1", server.uri());
        let result = health_check(&client_with_url(base_url.clone())).await.expect("health");
        assert_eq!(result["healthy"], true);
        assert!(result["latency_ms"].is_u64());
        assert!(result["base_url"].as_str().is_some_and(|url| url.starts_with(&server.uri())));

        let unreachable = health_check(&client_with_url("http://127.0.0.1:1/api/v1".to_string())).await.expect("health");
        assert_eq!(unreachable["healthy"], false);
    }
}
