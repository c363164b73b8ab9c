//! Sanitization helpers shared by the n8n MCP crates.
//!
//! [`sanitize`] redacts structured data by key; [`text_processing`] scrubs free
//! text such as transport error messages.

pub mod sanitize;
pub mod text_processing;

pub use sanitize::{
    MAX_DEPTH_MARKER, MAX_SANITIZE_DEPTH, REDACTED, is_sensitive_key, sanitize_headers, sanitize_url, sanitize_value,
    sanitize_value_at_depth,
};
pub use text_processing::{redact_json, redact_sensitive, strip_urls};
