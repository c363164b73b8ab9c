//! Tool handlers.
//!
//! Each handler takes its decoded request and the shared adapter and returns
//! the JSON payload placed in the tool result. Adapter failures are returned
//! untouched; the router turns them into error results.

pub mod credentials;
pub mod executions;
pub mod workflows;

use n8n_mcp_api::{ApiError, ApiErrorKind};
use serde::Serialize;
use serde_json::Value;

fn to_payload<T: Serialize>(context: &str, value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|error| ApiError::new(ApiErrorKind::Unknown, context, error.to_string()))
}
