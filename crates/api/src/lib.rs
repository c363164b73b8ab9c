//! n8n REST API client.
//!
//! This crate turns high-level workflow, execution and credential operations into
//! authenticated HTTP calls against an n8n instance. It focuses on:
//!
//! - Loading and validating [`ConnectionSettings`] from the environment
//! - Enforcing the transport policy (TLS, host allow-list, loopback-only HTTP)
//! - Bounding request and response sizes locally
//! - Folding every failure into a single [`ApiError`] taxonomy
//! - Retrying idempotent reads with capped exponential backoff
//!
//! The primary entry point is [`N8nClient`].
//!
//! # Example
//!
//! ```ignore
//! use n8n_mcp_api::{ConnectionSettings, N8nClient};
//!
//! async fn run() -> anyhow::Result<()> {
//!     let client = N8nClient::new(ConnectionSettings::from_env()?)?;
//!     for workflow in client.list_workflows().await? {
//!         println!("{} {}", workflow.id, workflow.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod retry;

use std::env;
use std::sync::Arc;

use n8n_mcp_types::{Credential, Execution, ExecutionListItem, ListEnvelope, Workflow, WorkflowListItem, WorkflowPatch};
use n8n_mcp_util::{redact_json, redact_sensitive, sanitize_headers, sanitize_url, sanitize_value};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

pub use config::{ConfigError, ConnectionSettings, RawSettings};
pub use error::{ApiError, ApiErrorKind};
pub use retry::RetryPolicy;

/// Header carrying the n8n API key.
pub const API_KEY_HEADER: &str = "X-N8N-API-KEY";

/// Characters escaped when an identifier is used as a path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Upper bound on pages followed through `nextCursor` for a single listing.
const MAX_LIST_PAGES: usize = 100;

/// Failure of a single attempt, tagged with whether another attempt may help.
type AttemptError = (ApiError, bool);

/// Thin wrapper around a configured `reqwest::Client` for n8n API access.
///
/// Cloning is cheap: the HTTP client and settings are reference counted, so one
/// instance can be shared by every concurrent session.
#[derive(Debug, Clone)]
pub struct N8nClient {
    settings: Arc<ConnectionSettings>,
    http: Client,
    user_agent: String,
    retry: RetryPolicy,
}

impl N8nClient {
    /// Construct a client from validated settings.
    ///
    /// The base URL is checked again against the transport policy and the host
    /// allow-list before any network traffic happens. Missing credentials are
    /// not an error; requests are then sent unauthenticated.
    pub fn new(settings: ConnectionSettings) -> Result<Self, ConfigError> {
        config::validate_api_url(settings.base_url().as_str(), settings.allow_insecure_http())?;
        validate_allowed_host(&settings)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(api_key) = settings.api_key() {
            let mut value = header::HeaderValue::from_str(api_key).map_err(|_| ConfigError::InvalidValue {
                name: config::ENV_API_KEY.to_string(),
                reason: "contains characters that are not allowed in an HTTP header".to_string(),
            })?;
            value.set_sensitive(true);
            default_headers.insert(API_KEY_HEADER, value);
        }

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(settings.timeout())
            .danger_accept_invalid_certs(!settings.validate_ssl())
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .build()
            .map_err(|error| ConfigError::HttpClient {
                reason: redact_sensitive(&error.to_string()),
            })?;

        let retry = RetryPolicy::new(settings.max_retries());
        debug!(base_url = %sanitize_url(settings.base_url().as_str()), max_retries = retry.max_retries(), "n8n client ready");

        Ok(Self {
            settings: Arc::new(settings),
            http,
            user_agent: format!("n8n-mcp/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
            retry,
        })
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Base URL with any embedded credentials redacted.
    pub fn display_base_url(&self) -> String {
        sanitize_url(self.settings.base_url().as_str())
    }

    /// List every workflow, following pagination cursors.
    pub async fn list_workflows(&self) -> Result<Vec<WorkflowListItem>, ApiError> {
        self.list_all("/workflows", "failed to list workflows").await
    }

    pub async fn get_workflow(&self, id: &str) -> Result<Workflow, ApiError> {
        let context = format!("failed to get workflow {id}");
        let path = format!("/workflows/{}", encode_segment(id));
        self.get_json(&path, &[], &context).await
    }

    pub async fn create_workflow(&self, workflow: &WorkflowPatch) -> Result<Workflow, ApiError> {
        let context = "failed to create workflow";
        let body = self.encode_body(workflow, context)?;
        let bytes = self.send(Method::POST, "/workflows", &[], Some(body), context).await?;
        decode(&bytes, context)
    }

    pub async fn update_workflow(&self, id: &str, workflow: &WorkflowPatch) -> Result<Workflow, ApiError> {
        let context = format!("failed to update workflow {id}");
        self.patch_workflow(id, workflow, &context).await
    }

    pub async fn delete_workflow(&self, id: &str) -> Result<(), ApiError> {
        let context = format!("failed to delete workflow {id}");
        let path = format!("/workflows/{}", encode_segment(id));
        self.send(Method::DELETE, &path, &[], None, &context).await.map(|_| ())
    }

    /// Activate or deactivate a workflow.
    pub async fn toggle_workflow(&self, id: &str, active: bool) -> Result<Workflow, ApiError> {
        let verb = if active { "activate" } else { "deactivate" };
        let context = format!("failed to {verb} workflow {id}");
        self.patch_workflow(id, &WorkflowPatch::activation(active), &context).await
    }

    /// Trigger a manual run. `data` becomes the request body when present.
    pub async fn execute_workflow(&self, id: &str, data: Option<&Value>) -> Result<Execution, ApiError> {
        let context = format!("failed to execute workflow {id}");
        let path = format!("/workflows/{}/execute", encode_segment(id));
        let body = data.map(|data| self.encode_body(data, &context)).transpose()?;
        let bytes = self.send(Method::POST, &path, &[], body, &context).await?;
        decode(&bytes, &context)
    }

    /// List executions, optionally filtered by workflow and capped at `limit`.
    pub async fn list_executions(&self, workflow_id: Option<&str>, limit: Option<u32>) -> Result<Vec<ExecutionListItem>, ApiError> {
        let context = "failed to list executions";
        let mut query = Vec::new();
        if let Some(workflow_id) = workflow_id {
            query.push(("workflowId", workflow_id.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        let envelope: ListEnvelope<ExecutionListItem> = self.get_json("/executions", &query, context).await?;
        Ok(envelope.data)
    }

    pub async fn get_execution(&self, id: &str) -> Result<Execution, ApiError> {
        let context = format!("failed to get execution {id}");
        let path = format!("/executions/{}", encode_segment(id));
        self.get_json(&path, &[], &context).await
    }

    pub async fn delete_execution(&self, id: &str) -> Result<(), ApiError> {
        let context = format!("failed to delete execution {id}");
        let path = format!("/executions/{}", encode_segment(id));
        self.send(Method::DELETE, &path, &[], None, &context).await.map(|_| ())
    }

    /// List credential metadata. Secret material is never returned by the platform.
    pub async fn list_credentials(&self) -> Result<Vec<Credential>, ApiError> {
        self.list_all("/credentials", "failed to list credentials").await
    }

    /// Probe the API with a single unretried read. Never fails.
    pub async fn health_check(&self) -> bool {
        match self.attempt(&Method::GET, "/workflows", &[], None, "health check failed").await {
            Ok(_) => true,
            Err((error, _)) => {
                warn!(error = %error.redacted(), "n8n health check failed");
                false
            }
        }
    }

    /// Build a `reqwest::RequestBuilder` for a method and API-relative path.
    ///
    /// The request carries the configured User-Agent and, when no API key is
    /// configured, HTTP basic credentials.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.settings.api_base(), path);
        let builder = self.http.request(method, url).header(header::USER_AGENT, &self.user_agent);

        match (self.settings.api_key(), self.settings.basic_credentials()) {
            (None, Some((username, password))) => builder.basic_auth(username, Some(password)),
            _ => builder,
        }
    }

    async fn patch_workflow(&self, id: &str, workflow: &WorkflowPatch, context: &str) -> Result<Workflow, ApiError> {
        let path = format!("/workflows/{}", encode_segment(id));
        let body = self.encode_body(workflow, context)?;
        let bytes = self.send(Method::PATCH, &path, &[], Some(body), context).await?;
        decode(&bytes, context)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)], context: &str) -> Result<T, ApiError> {
        let bytes = self.send(Method::GET, path, query, None, context).await?;
        decode(&bytes, context)
    }

    async fn list_all<T: DeserializeOwned>(&self, path: &str, context: &str) -> Result<Vec<T>, ApiError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let query: Vec<(&str, String)> = cursor.take().map(|cursor| vec![("cursor", cursor)]).unwrap_or_default();
            let envelope: ListEnvelope<T> = self.get_json(path, &query, context).await?;
            items.extend(envelope.data);
            match envelope.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => return Ok(items),
            }
        }

        warn!(path, pages = MAX_LIST_PAGES, "listing truncated after page limit");
        Ok(items)
    }

    /// Serialize a request body and enforce the request size limit before sending.
    fn encode_body<T: Serialize + ?Sized>(&self, body: &T, context: &str) -> Result<Vec<u8>, ApiError> {
        let bytes = serde_json::to_vec(body).map_err(|error| ApiError::new(ApiErrorKind::Unknown, context, format!("failed to encode request body: {error}")))?;
        let limit = self.settings.max_request_size();
        if bytes.len() as u64 > limit {
            return Err(ApiError::payload_too_large(context, bytes.len(), limit));
        }
        Ok(bytes)
    }

    /// Send a request, retrying idempotent reads on transient failures.
    async fn send(&self, method: Method, path: &str, query: &[(&str, String)], body: Option<Vec<u8>>, context: &str) -> Result<Vec<u8>, ApiError> {
        let policy = if method == Method::GET { self.retry } else { RetryPolicy::none() };
        let mut last_error = ApiError::new(ApiErrorKind::Unknown, context, "no attempt was made");

        for attempt in 0..=policy.max_retries() {
            match self.attempt(&method, path, query, body.as_deref(), context).await {
                Ok(bytes) => return Ok(bytes),
                Err((error, should_retry)) => {
                    last_error = error;

                    if !should_retry || attempt >= policy.max_retries() {
                        break;
                    }

                    let delay = policy.backoff_delay(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = policy.max_retries(),
                        delay_ms = delay.as_millis() as u64,
                        error = %last_error.redacted(),
                        "n8n request failed, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(last_error)
    }

    /// Perform exactly one request and return the bounded response body.
    async fn attempt(&self, method: &Method, path: &str, query: &[(&str, String)], body: Option<&[u8]>, context: &str) -> Result<Vec<u8>, AttemptError> {
        let mut builder = self.request(method.clone(), path);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.header(header::CONTENT_TYPE, "application/json").body(body.to_vec());
        }
        let request = builder.build().map_err(|error| (ApiError::from_transport(context, &error), false))?;

        let url = sanitize_url(request.url().as_str());
        debug!(method = %request.method(), %url, headers = ?sanitize_headers(request.headers()), "sending request");

        let response = self.http.execute(request).await.map_err(|error| {
            let retryable = retry::is_retryable_transport(&error);
            let mapped = ApiError::from_transport(context, &error);
            debug!(%url, error = %mapped.redacted(), "request failed before a response arrived");
            (mapped, retryable)
        })?;

        let status = response.status();
        debug!(status = status.as_u16(), %url, "received response");

        if status.is_success() {
            return read_bounded(response, self.settings.max_response_size())
                .await
                .map_err(|failure| (failure.into_api_error(context, self.settings.max_response_size()), false));
        }

        // Error bodies only feed the message lookup, so an oversized one is dropped.
        let body = read_bounded(response, self.settings.max_response_size()).await.unwrap_or_default();
        let error = ApiError::from_status(context, status, &body);
        log_rejection(&error, status, &body);
        Err((error, retry::is_retryable_status(status)))
    }
}

fn validate_allowed_host(settings: &ConnectionSettings) -> Result<(), ConfigError> {
    let allowed = settings.allowed_hosts();
    if allowed.is_empty() {
        return Ok(());
    }
    let host = settings.host().to_ascii_lowercase();
    if allowed.iter().any(|candidate| candidate == &host) {
        return Ok(());
    }
    Err(ConfigError::HostNotAllowed {
        host,
        allowed: allowed.join(", "),
    })
}

fn encode_segment(id: &str) -> String {
    utf8_percent_encode(id, PATH_SEGMENT).to_string()
}

fn decode<T: DeserializeOwned>(bytes: &[u8], context: &str) -> Result<T, ApiError> {
    serde_json::from_slice(bytes).map_err(|error| ApiError::decode(context, &error))
}

fn log_rejection(error: &ApiError, status: StatusCode, body: &[u8]) {
    let body = serde_json::from_slice::<Value>(body)
        .map(|value| redact_json(&sanitize_value(&value)).to_string())
        .unwrap_or_else(|_| redact_sensitive(&String::from_utf8_lossy(body)));
    debug!(
        kind = %error.kind(),
        status = status.as_u16(),
        error = %error.redacted(),
        body = %body,
        "request rejected"
    );
}

enum BodyFailure {
    TooLarge,
    Transport(reqwest::Error),
}

impl BodyFailure {
    fn into_api_error(self, context: &str, limit: u64) -> ApiError {
        match self {
            Self::TooLarge => ApiError::response_too_large(context, limit),
            Self::Transport(error) => ApiError::from_transport(context, &error),
        }
    }
}

/// Read a response body, aborting as soon as it exceeds `limit` bytes.
async fn read_bounded(mut response: Response, limit: u64) -> Result<Vec<u8>, BodyFailure> {
    if response.content_length().is_some_and(|length| length > limit) {
        return Err(BodyFailure::TooLarge);
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(BodyFailure::Transport)? {
        if (body.len() + chunk.len()) as u64 > limit {
            return Err(BodyFailure::TooLarge);
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> ConnectionSettings {
        let values: std::collections::HashMap<String, String> = pairs.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect();
        ConnectionSettings::from_lookup(|name| values.get(name).cloned()).expect("settings")
    }

    #[test]
    fn ids_are_percent_encoded() {
        assert_eq!(encode_segment("abc-123"), "abc-123");
        assert_eq!(encode_segment("a/b c"), "a%2Fb%20c");
        assert_eq!(encode_segment("../x"), "..%2Fx");
    }

    #[test]
    fn allow_list_rejects_unlisted_host() {
        let settings = settings(&[
            (config::ENV_API_URL, "https://n8n.example.com/api/v1"),
            (config::ENV_ALLOWED_HOSTS, "other.example.com"),
        ]);
        let error = N8nClient::new(settings).expect_err("host must be rejected");
        assert!(matches!(error, ConfigError::HostNotAllowed { ref host, .. } if host == "n8n.example.com"));
    }

    #[test]
    fn allow_list_accepts_listed_host() {
        let settings = settings(&[
            (config::ENV_API_URL, "https://N8N.example.com/api/v1"),
            (config::ENV_ALLOWED_HOSTS, "n8n.example.com"),
        ]);
        assert!(N8nClient::new(settings).is_ok());
    }

    #[test]
    fn api_key_must_be_a_valid_header_value() {
        let settings = settings(&[(config::ENV_API_URL, "https://n8n.example.com"), (config::ENV_API_KEY, "bad\nkey")]);
        assert!(matches!(N8nClient::new(settings), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn request_url_joins_base_and_path() {
        let client = N8nClient::new(settings(&[(config::ENV_API_URL, "https://n8n.example.com/api/v1/")])).expect("client");
        let request = client.request(Method::GET, "/workflows").build().expect("request");
        assert_eq!(request.url().as_str(), "https://n8n.example.com/api/v1/workflows");
        assert!(request.headers().get(header::USER_AGENT).is_some());
    }

    #[test]
    fn basic_auth_is_only_used_without_api_key() {
        let basic = N8nClient::new(settings(&[
            (config::ENV_API_URL, "https://n8n.example.com"),
            (config::ENV_USERNAME, "admin"),
            (config::ENV_PASSWORD, "pw"),
        ]))
        .expect("client");
        let request = basic.request(Method::GET, "/workflows").build().expect("request");
        assert!(request.headers().get(header::AUTHORIZATION).is_some());

        let keyed = N8nClient::new(settings(&[
            (config::ENV_API_URL, "https://n8n.example.com"),
            (config::ENV_API_KEY, "k"),
            (config::ENV_USERNAME, "admin"),
            (config::ENV_PASSWORD, "pw"),
        ]))
        .expect("client");
        let request = keyed.request(Method::GET, "/workflows").build().expect("request");
        assert!(request.headers().get(header::AUTHORIZATION).is_none());
    }
}
