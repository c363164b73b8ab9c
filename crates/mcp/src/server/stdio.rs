//! MCP over stdin/stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use n8n_mcp_api::N8nClient;
use rmcp::ServiceExt;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::server::core::N8nMcpCore;

/// Serve one MCP session on stdio until the peer disconnects or `shutdown` fires.
pub async fn serve_stdio(client: Arc<N8nClient>, shutdown: CancellationToken) -> Result<()> {
    let service = N8nMcpCore::new(client)
        .serve_with_ct(rmcp::transport::stdio(), shutdown)
        .await
        .context("failed to start MCP stdio session")?;
    info!("MCP stdio session started");
    let reason = service.waiting().await.context("MCP stdio session task failed")?;
    info!(?reason, "MCP stdio session ended");
    Ok(())
}
