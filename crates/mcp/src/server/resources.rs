//! Workflow resources addressable as `n8n://workflow/{id}`.

use n8n_mcp_api::N8nClient;
use n8n_mcp_types::WorkflowListItem;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use rmcp::model::{
    AnnotateAble, ErrorData, ListResourceTemplatesResult, ListResourcesResult, RawResource, RawResourceTemplate, ReadResourceResult,
    Resource, ResourceContents,
};
use serde_json::json;
use tracing::error;

use crate::server::errors::{internal_error, not_found_error, resource_error};

const WORKFLOW_URI_PREFIX: &str = "n8n://workflow/";
const JSON_MIME_TYPE: &str = "application/json";

/// Characters escaped when a workflow id becomes the last URI segment.
const URI_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Enumerate every workflow as a resource. A failed listing yields an empty list.
pub async fn list_resources(client: &N8nClient) -> ListResourcesResult {
    match client.list_workflows().await {
        Ok(workflows) => ListResourcesResult::with_all_items(workflows.iter().map(workflow_resource).collect()),
        Err(list_error) => {
            error!(error = %list_error.redacted(), "failed to list workflow resources");
            ListResourcesResult::with_all_items(Vec::new())
        }
    }
}

pub fn list_resource_templates() -> ListResourceTemplatesResult {
    let templates = vec![
        RawResourceTemplate {
            uri_template: format!("{WORKFLOW_URI_PREFIX}{{workflow_id}}"),
            name: "n8n.workflow".to_string(),
            title: Some("Workflow by id".to_string()),
            description: Some("Full workflow definition including nodes and connections.".to_string()),
            mime_type: Some(JSON_MIME_TYPE.to_string()),
            icons: None,
        }
        .no_annotation(),
    ];
    ListResourceTemplatesResult::with_all_items(templates)
}

/// Read one workflow resource as pretty-printed JSON.
pub async fn read_resource(uri: &str, client: &N8nClient) -> Result<ReadResourceResult, ErrorData> {
    let Some(workflow_id) = parse_workflow_uri(uri) else {
        return Err(not_found_error(
            "RESOURCE_URI_UNKNOWN",
            format!("unknown resource URI '{uri}'"),
            json!({ "uri": uri }),
            "Use a URI of the form n8n://workflow/{workflow_id} from resources/list.",
        ));
    };

    let workflow = client.get_workflow(&workflow_id).await.map_err(|read_error| resource_error(uri, &read_error))?;
    let text = serde_json::to_string_pretty(&workflow).map_err(|encode_error| {
        internal_error(
            "RESOURCE_ENCODE_FAILED",
            encode_error.to_string(),
            json!({ "uri": uri }),
            false,
            "Retry the read.",
        )
    })?;

    Ok(ReadResourceResult {
        contents: vec![ResourceContents::TextResourceContents {
            uri: uri.to_string(),
            mime_type: Some(JSON_MIME_TYPE.to_string()),
            text,
            meta: None,
        }],
    })
}

/// Extract the workflow id from `n8n://workflow/{id}`.
///
/// The id must be a single non-empty path segment; percent escapes are decoded.
pub fn parse_workflow_uri(uri: &str) -> Option<String> {
    let raw_id = uri.strip_prefix(WORKFLOW_URI_PREFIX)?;
    if raw_id.is_empty() || raw_id.contains(['/', '?', '#']) {
        return None;
    }
    let decoded = percent_decode_str(raw_id).decode_utf8().ok()?;
    let workflow_id = decoded.trim();
    if workflow_id.is_empty() {
        return None;
    }
    Some(workflow_id.to_string())
}

/// Build `n8n://workflow/{id}`, escaping the id so [`parse_workflow_uri`] recovers it.
pub fn workflow_uri(workflow_id: &str) -> String {
    format!("{WORKFLOW_URI_PREFIX}{}", utf8_percent_encode(workflow_id, URI_SEGMENT))
}

fn workflow_resource(workflow: &WorkflowListItem) -> Resource {
    let state = if workflow.active { "active" } else { "inactive" };
    RawResource {
        uri: workflow_uri(&workflow.id),
        name: workflow.name.clone(),
        title: Some(workflow.name.clone()),
        description: Some(format!("n8n workflow ({state})")),
        mime_type: Some(JSON_MIME_TYPE.to_string()),
        size: None,
        icons: None,
        meta: None,
    }
    .no_annotation()
}
