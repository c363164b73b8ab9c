//! Streamable HTTP host for the MCP server.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use axum::Router;
use n8n_mcp_api::N8nClient;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::server::core::N8nMcpCore;

/// Path the MCP endpoint is mounted on.
pub const MCP_PATH: &str = "/mcp";

/// Host configuration for an MCP HTTP server instance.
#[derive(Debug, Clone)]
pub struct McpHttpServer {
    bind_address: SocketAddr,
    client: Arc<N8nClient>,
}

impl McpHttpServer {
    pub fn new(bind_address: SocketAddr, client: Arc<N8nClient>) -> Self {
        Self { bind_address, client }
    }

    /// Start the server and return a handle for runtime inspection and shutdown.
    ///
    /// Every session gets its own [`N8nMcpCore`]; all of them share one client.
    pub async fn start(self) -> Result<RunningMcpHttpServer> {
        let shutdown = CancellationToken::new();
        let session_manager = Arc::new(LocalSessionManager::default());
        let session_count = Arc::new(AtomicUsize::new(0));

        let router = build_router(Arc::clone(&self.client), Arc::clone(&session_manager), shutdown.child_token());
        let listener = tokio::net::TcpListener::bind(self.bind_address)
            .await
            .with_context(|| format!("failed to bind MCP HTTP server to {}", self.bind_address))?;
        let bound_address = listener.local_addr()?;
        info!(address = %bound_address, path = MCP_PATH, "MCP HTTP server listening");

        let serve_shutdown = shutdown.child_token();
        let server_task = tokio::spawn(async move {
            if let Err(serve_error) = axum::serve(listener, router)
                .with_graceful_shutdown(async move { serve_shutdown.cancelled().await })
                .await
            {
                warn!(error = %serve_error, "MCP HTTP server exited with an error");
            }
        });
        let monitor_task = spawn_session_monitor(session_manager, Arc::clone(&session_count), shutdown.child_token());

        Ok(RunningMcpHttpServer {
            bound_address,
            shutdown,
            tasks: [server_task, monitor_task],
            session_count,
        })
    }
}

fn build_router(client: Arc<N8nClient>, session_manager: Arc<LocalSessionManager>, cancellation_token: CancellationToken) -> Router {
    let service: StreamableHttpService<N8nMcpCore, LocalSessionManager> = StreamableHttpService::new(
        move || Ok(N8nMcpCore::new(Arc::clone(&client))),
        session_manager,
        StreamableHttpServerConfig {
            stateful_mode: true,
            sse_keep_alive: None,
            cancellation_token,
            ..Default::default()
        },
    );
    Router::new().nest_service(MCP_PATH, service)
}

/// Handle for a running MCP HTTP server.
#[derive(Debug)]
pub struct RunningMcpHttpServer {
    bound_address: SocketAddr,
    shutdown: CancellationToken,
    tasks: [JoinHandle<()>; 2],
    session_count: Arc<AtomicUsize>,
}

impl RunningMcpHttpServer {
    pub fn bound_address(&self) -> SocketAddr {
        self.bound_address
    }

    /// Most recently observed number of live MCP sessions.
    pub fn connected_clients(&self) -> usize {
        self.session_count.load(Ordering::Relaxed)
    }

    /// Cancel every session, drain the listener and wait for background tasks.
    pub async fn stop(self) -> Result<()> {
        self.shutdown.cancel();
        for task in self.tasks {
            task.await.map_err(|error| anyhow!("MCP HTTP background task failed: {error}"))?;
        }
        info!("MCP HTTP server stopped");
        Ok(())
    }
}

/// Resolve the bind address, defaulting to `127.0.0.1:{default_port}`.
///
/// Only loopback addresses are accepted.
pub fn resolve_bind_address(bind_address: Option<&str>, default_port: u16) -> Result<SocketAddr> {
    let parsed = match bind_address.map(str::trim).filter(|value| !value.is_empty()) {
        Some(address) => address
            .parse::<SocketAddr>()
            .map_err(|error| anyhow!("invalid MCP HTTP bind address '{address}': {error}"))?,
        None => SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), default_port),
    };
    if !parsed.ip().is_loopback() {
        return Err(anyhow!("MCP HTTP server must bind to a loopback address, got {}", parsed.ip()));
    }
    Ok(parsed)
}

const SESSION_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Mirror the session manager's live session count into `session_count`.
fn spawn_session_monitor(
    session_manager: Arc<LocalSessionManager>,
    session_count: Arc<AtomicUsize>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_POLL_INTERVAL);
        while shutdown.run_until_cancelled(ticker.tick()).await.is_some() {
            let live = session_manager.sessions.read().await.len();
            if session_count.swap(live, Ordering::Relaxed) != live {
                debug!(sessions = live, "MCP HTTP session count changed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use n8n_mcp_api::ConnectionSettings;

    #[test]
    fn defaults_to_loopback_port() {
        let address = resolve_bind_address(None, 3000).expect("address");
        assert_eq!(address, "127.0.0.1:3000".parse::<SocketAddr>().expect("literal"));
        assert_eq!(resolve_bind_address(Some(""), 4000).expect("address").port(), 4000);
    }

    #[test]
    fn accepts_explicit_loopback() {
        assert!(resolve_bind_address(Some("[::1]:8080"), 3000).is_ok());
        assert!(resolve_bind_address(Some("127.0.0.1:0"), 3000).is_ok());
    }

    #[test]
    fn rejects_public_and_malformed_addresses() {
        let public = resolve_bind_address(Some("0.0.0.0:3000"), 3000).expect_err("public");
        assert!(public.to_string().contains("loopback"));
        assert!(resolve_bind_address(Some("localhost"), 3000).is_err());
    }

    #[tokio::test]
    async fn starts_and_stops_on_ephemeral_port() {
        let settings = ConnectionSettings::from_lookup(|name| match name {
            "N8N_API_URL" => Some("http://127.0.0.1:5678/api/v1".to_string()),
            _ => None,
        })
        .expect("settings");
        let client = Arc::new(N8nClient::new(settings).expect("client"));
        let address = resolve_bind_address(Some("127.0.0.1:0"), 3000).expect("address");

        let running = McpHttpServer::new(address, client).start().await.expect("server");
        assert_ne!(running.bound_address().port(), 0);
        assert_eq!(running.connected_clients(), 0);
        running.stop().await.expect("stop");
    }
}
