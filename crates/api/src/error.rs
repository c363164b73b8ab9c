//! Uniform error taxonomy for adapter operations.
//!
//! Every failure an operation can hit (transport, HTTP status, size limits,
//! decoding) is folded into one [`ApiError`] carrying a stable [`ApiErrorKind`],
//! the operation context (`failed to get workflow wf-1`) and a sanitized detail
//! string that is safe to log or hand back to a tool caller.

use std::fmt;

use n8n_mcp_util::{redact_sensitive, strip_urls};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

/// Stable classification of adapter failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// HTTP 401.
    Unauthorized,
    /// HTTP 404.
    NotFound,
    /// HTTP 403.
    Forbidden,
    /// HTTP 413, or a request body larger than the configured limit.
    PayloadTooLarge,
    /// The request did not finish within the configured timeout.
    Timeout,
    /// The response body exceeded the configured limit.
    ResponseTooLarge,
    /// The platform returned an error body with a `message` field.
    RemoteMessage,
    /// Anything else, including undecodable success bodies.
    Unknown,
}

impl ApiErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::PayloadTooLarge => "payload_too_large",
            Self::Timeout => "timeout",
            Self::ResponseTooLarge => "response_too_large",
            Self::RemoteMessage => "remote_message",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed adapter operation.
///
/// Displays as `"{context}: {detail}"`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{context}: {detail}")]
pub struct ApiError {
    kind: ApiErrorKind,
    context: String,
    detail: String,
    status: Option<u16>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, context: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            context: context.into(),
            detail: detail.into(),
            status: None,
        }
    }

    fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status.as_u16());
        self
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    /// Operation description, e.g. `failed to list workflows`.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Sanitized failure reason.
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// HTTP status of the failing response, when there was one.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Display form with secret-looking values redacted, for log lines.
    ///
    /// Remote messages are kept verbatim for callers, so anything that logs an
    /// error goes through this instead of `Display`.
    pub fn redacted(&self) -> String {
        redact_sensitive(&self.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ApiErrorKind::NotFound
    }

    pub(crate) fn payload_too_large(context: &str, size: usize, limit: u64) -> Self {
        Self::new(
            ApiErrorKind::PayloadTooLarge,
            context,
            format!("request body of {size} bytes exceeds the {limit} byte limit. Check MAX_REQUEST_SIZE"),
        )
    }

    pub(crate) fn response_too_large(context: &str, limit: u64) -> Self {
        Self::new(
            ApiErrorKind::ResponseTooLarge,
            context,
            format!("response body exceeds the {limit} byte limit. Check MAX_RESPONSE_SIZE"),
        )
    }

    pub(crate) fn decode(context: &str, error: &serde_json::Error) -> Self {
        Self::new(ApiErrorKind::Unknown, context, format!("unexpected response body: {error}"))
    }

    /// Map a transport-level failure (no HTTP response was received).
    pub(crate) fn from_transport(context: &str, error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::new(ApiErrorKind::Timeout, context, "request timed out. Check REQUEST_TIMEOUT");
        }
        let mut message = error.to_string();
        let mut source = std::error::Error::source(error);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::new(ApiErrorKind::Unknown, context, scrub(&message))
    }

    /// Map a non-success HTTP response given its status and (bounded) body.
    pub(crate) fn from_status(context: &str, status: StatusCode, body: &[u8]) -> Self {
        let error = match status {
            StatusCode::UNAUTHORIZED => Self::new(ApiErrorKind::Unauthorized, context, "unauthorized. Check your API credentials"),
            StatusCode::NOT_FOUND => Self::new(ApiErrorKind::NotFound, context, "resource not found"),
            StatusCode::FORBIDDEN => Self::new(ApiErrorKind::Forbidden, context, "access denied"),
            StatusCode::PAYLOAD_TOO_LARGE => {
                Self::new(ApiErrorKind::PayloadTooLarge, context, "payload too large. Check MAX_REQUEST_SIZE")
            }
            _ => match remote_message(body) {
                Some(message) => Self::new(ApiErrorKind::RemoteMessage, context, message),
                None => Self::new(ApiErrorKind::Unknown, context, format!("HTTP {}", status.as_u16())),
            },
        };
        error.with_status(status)
    }
}

/// Extract the platform's `message` field from a JSON error body.
fn remote_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value.get("message")?.as_str().map(str::to_string)
}

fn scrub(message: &str) -> String {
    redact_sensitive(&strip_urls(message))
}
