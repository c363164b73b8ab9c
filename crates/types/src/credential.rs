//! Credential metadata and workflow tags.
//!
//! Credential secrets are never returned by the platform's list endpoint; only
//! the descriptive fields below are modeled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Credential metadata as listed by `GET /credentials`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(deserialize_with = "crate::deserialize_identifier")]
    pub id: String,
    pub name: String,
    /// Credential type, for example `httpHeaderAuth`.
    #[serde(rename = "type")]
    pub credential_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Label attached to workflows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(deserialize_with = "crate::deserialize_identifier")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
