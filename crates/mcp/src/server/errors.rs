//! Structured error payloads for protocol errors and failed tool calls.

use chrono::Utc;
use n8n_mcp_api::{ApiError, ApiErrorKind};
use rmcp::model::ErrorData;
use serde_json::{Value, json};

fn build_error_data(error_code: &str, category: &str, message: &str, context: Value, retryable: bool, suggested_action: &str) -> Value {
    json!({
        "error_code": error_code,
        "category": category,
        "message": message,
        "context": context,
        "retryable": retryable,
        "suggested_action": suggested_action,
        "correlation_id": format!("n8n-{}", Utc::now().timestamp_millis()),
    })
}

pub fn invalid_params_error(error_code: &str, message: impl Into<String>, context: Value, suggested_action: &str) -> ErrorData {
    let message = message.into();
    ErrorData::invalid_params(
        message.clone(),
        Some(build_error_data(error_code, "validation", &message, context, false, suggested_action)),
    )
}

pub fn not_found_error(error_code: &str, message: impl Into<String>, context: Value, suggested_action: &str) -> ErrorData {
    let message = message.into();
    ErrorData::resource_not_found(
        message.clone(),
        Some(build_error_data(error_code, "not_found", &message, context, false, suggested_action)),
    )
}

pub fn internal_error(error_code: &str, message: impl Into<String>, context: Value, retryable: bool, suggested_action: &str) -> ErrorData {
    let message = message.into();
    ErrorData::internal_error(
        message.clone(),
        Some(build_error_data(error_code, "remote", &message, context, retryable, suggested_action)),
    )
}

/// Reject an empty or whitespace-only identifier argument.
pub fn require_identifier(field: &str, value: &str) -> Result<(), ErrorData> {
    if value.trim().is_empty() {
        return Err(invalid_params_error(
            "MISSING_IDENTIFIER",
            format!("'{field}' must not be empty"),
            json!({ "field": field }),
            "Pass an identifier returned by a list tool.",
        ));
    }
    Ok(())
}

/// Payload attached to a tool result whose adapter call failed.
pub fn tool_failure_payload(tool: &str, error: &ApiError) -> Value {
    json!({
        "error": error.to_string(),
        "kind": error.kind(),
        "tool": tool,
    })
}

/// Map an adapter failure while reading a resource to a protocol error.
pub fn resource_error(uri: &str, error: &ApiError) -> ErrorData {
    let context = json!({ "uri": uri, "kind": error.kind(), "status": error.status() });
    if error.is_not_found() {
        return not_found_error(
            "RESOURCE_NOT_FOUND",
            error.to_string(),
            context,
            "List resources again; the workflow may have been deleted.",
        );
    }
    let retryable = matches!(error.kind(), ApiErrorKind::Timeout) || error.status().is_some_and(|status| status >= 500);
    internal_error(
        "RESOURCE_READ_FAILED",
        error.to_string(),
        context,
        retryable,
        suggested_action(error.kind()),
    )
}

fn suggested_action(kind: ApiErrorKind) -> &'static str {
    match kind {
        ApiErrorKind::Unauthorized | ApiErrorKind::Forbidden => "Check N8N_API_KEY or N8N_USERNAME/N8N_PASSWORD.",
        ApiErrorKind::Timeout => "Retry later or raise REQUEST_TIMEOUT.",
        ApiErrorKind::ResponseTooLarge => "Raise MAX_RESPONSE_SIZE.",
        ApiErrorKind::PayloadTooLarge => "Raise MAX_REQUEST_SIZE.",
        _ => "Check that the n8n instance is reachable with health_check.",
    }
}
