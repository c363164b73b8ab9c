//! # Free-text redaction
//!
//! Transport errors and remote error bodies arrive as plain strings. They can
//! carry credentials (echoed headers, `KEY=value` pairs, bearer tokens) and full
//! request URLs. The helpers here scrub both before the text reaches a log line
//! or an error surfaced to a tool caller.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::sanitize::REDACTED;

/// Keywords whose `KEY=value` or `key: value` assignments get redacted.
const SENSITIVE_ASSIGNMENT_KEYWORDS: &[&str] = &[
    "API_KEY",
    "APIKEY",
    "N8N_API_KEY",
    "X_N8N_API_KEY",
    "ACCESS_TOKEN",
    "AUTH_TOKEN",
    "REFRESH_TOKEN",
    "TOKEN",
    "CLIENT_SECRET",
    "SECRET",
    "PASSWORD",
    "PASSWD",
    "CREDENTIAL",
];

/// Redacts values that look like secrets in a string.
///
/// Key names are preserved so the surrounding message stays useful.
///
/// # Example
/// ```rust
/// use n8n_mcp_util::text_processing::redact_sensitive;
///
/// assert_eq!(redact_sensitive("N8N_API_KEY=abc123"), "N8N_API_KEY=[REDACTED]");
/// assert_eq!(redact_sensitive("Authorization: Bearer abc"), "Authorization: [REDACTED]");
/// ```
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();

    for pattern in redact_patterns().iter() {
        redacted = pattern
            .replace_all(&redacted, |captures: &regex::Captures| {
                let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                let suffix = captures.get(3).map(|m| m.as_str()).unwrap_or("");
                format!("{prefix}{REDACTED}{suffix}")
            })
            .to_string();
    }

    redacted
}

/// Replaces every absolute `http(s)` URL in `input` with `<url>`.
///
/// reqwest embeds the full request URL in its error text; surfaced messages
/// keep the failure reason without exposing hosts, paths or query strings.
pub fn strip_urls(input: &str) -> String {
    static URL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bhttps?://[^\s"'<>)]+"#).unwrap());
    URL_PATTERN.replace_all(input, "<url>").into_owned()
}

/// Redacts every string leaf of a JSON value with [`redact_sensitive`].
///
/// Complements key-based sanitization for payloads whose secrets sit inside
/// free-text fields.
pub fn redact_json(value: &Value) -> Value {
    match value {
        Value::String(text) => Value::String(redact_sensitive(text)),
        Value::Array(items) => Value::Array(items.iter().map(redact_json).collect()),
        Value::Object(map) => Value::Object(map.iter().map(|(key, item)| (key.clone(), redact_json(item))).collect()),
        other => other.clone(),
    }
}

fn redact_patterns() -> &'static Vec<Regex> {
    static REDACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(build_redact_patterns);

    &REDACT_PATTERNS
}

fn build_redact_patterns() -> Vec<Regex> {
    let keywords = build_keyword_fragment(SENSITIVE_ASSIGNMENT_KEYWORDS);

    let shell_assignment = format!(r"(?i)((?:export\s+)?[A-Za-z0-9_]*?(?:{keywords})[A-Za-z0-9_]*\s*=\s*)([^\s&]+)");
    let json_assignment = format!("(?i)(\"[A-Za-z0-9_.-]*?(?:{keywords})[A-Za-z0-9_.-]*\"\\s*:\\s*\")([^\"]*)(\")");

    vec![
        Regex::new(r"(?i)(authorization:\s+)([^\s]+(?:\s+[^\s,;]+)?)").unwrap(),
        Regex::new(r"(?i)(x-n8n-api-key:\s+)([^\s,;]+)").unwrap(),
        Regex::new(r"(?i)((?:^|\b)Bearer\s+)([A-Za-z0-9\-._~+/]+=*)").unwrap(),
        Regex::new(r"(?i)((?:^|\b)Basic\s+)([A-Za-z0-9+/]+=*)").unwrap(),
        Regex::new(&json_assignment).unwrap(),
        Regex::new(&shell_assignment).unwrap(),
        Regex::new(r"(eyJ[A-Za-z0-9\-_]+\.[A-Za-z0-9\-_]+\.[A-Za-z0-9\-_]*)").unwrap(),
    ]
}

fn build_keyword_fragment(keywords: &[&str]) -> String {
    keywords
        .iter()
        .map(|keyword| keyword.split('_').map(regex::escape).collect::<Vec<_>>().join("[_\\-]?"))
        .collect::<Vec<_>>()
        .join("|")
}
