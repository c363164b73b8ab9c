use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use n8n_mcp_api::{ConnectionSettings, N8nClient};
use n8n_mcp_server::{LogLevel, MCP_PATH, McpHttpServer, ServerSettings, resolve_bind_address, serve_stdio};
use n8n_mcp_util::redact_sensitive;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Serve the n8n REST API as Model Context Protocol tools.
#[derive(Parser, Debug)]
#[command(name = "n8n-mcp", version, about)]
struct Args {
    /// Transport used to talk to the MCP client
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    transport: Transport,

    /// Loopback address for the HTTP transport (defaults to 127.0.0.1:$PORT)
    #[arg(long)]
    bind: Option<String>,

    /// Dotenv file to load before reading settings (defaults to ./.env when present)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Validate settings, probe the API once, print the result and exit
    #[arg(long)]
    check: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    Stdio,
    Http,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let env_file_result = load_env_file(args.env_file.as_ref());

    let server_settings = ServerSettings::from_env();
    init_tracing(server_settings.as_ref().map(ServerSettings::log_level).unwrap_or_default());

    let outcome = match (env_file_result, server_settings) {
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(anyhow::Error::new(error).context("invalid server settings")),
        (Ok(()), Ok(settings)) => run(args, settings).await,
    };

    match outcome {
        Ok(code) => code,
        Err(failure) => {
            error!(error = %redact_sensitive(&format!("{failure:#}")), "n8n-mcp stopped");
            ExitCode::FAILURE
        }
    }
}

fn load_env_file(path: Option<&PathBuf>) -> Result<()> {
    match path {
        Some(path) => dotenvy::from_path(path)
            .map(|_| ())
            .with_context(|| format!("failed to load env file {}", path.display())),
        None => ignore_missing_env_file(dotenvy::dotenv()),
    }
}

/// A missing default `.env` is fine; an unreadable or malformed one is not.
fn ignore_missing_env_file<T>(result: dotenvy::Result<T>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(error) if error.not_found() => Ok(()),
        Err(error) => Err(error).context("failed to load .env"),
    }
}

fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run(args: Args, server_settings: ServerSettings) -> Result<ExitCode> {
    let connection = ConnectionSettings::from_env().context("invalid n8n connection settings")?;
    let client = Arc::new(N8nClient::new(connection).context("failed to build n8n client")?);
    info!(base_url = %client.display_base_url(), transport = ?args.transport, "n8n-mcp starting");

    if args.check {
        return check(&client).await;
    }

    let shutdown = CancellationToken::new();
    spawn_ctrl_c_listener(shutdown.clone());

    match args.transport {
        Transport::Stdio => serve_stdio(client, shutdown).await?,
        Transport::Http => {
            let bind_address = resolve_bind_address(args.bind.as_deref(), server_settings.port())?;
            let running = McpHttpServer::new(bind_address, client).start().await?;
            info!(endpoint = %format!("http://{}{}", running.bound_address(), MCP_PATH), "MCP HTTP endpoint ready");
            shutdown.cancelled().await;
            info!(sessions = running.connected_clients(), "shutting down MCP HTTP server");
            running.stop().await?;
        }
    }

    info!("n8n-mcp stopped");
    Ok(ExitCode::SUCCESS)
}

async fn check(client: &N8nClient) -> Result<ExitCode> {
    let healthy = client.health_check().await;
    let report = serde_json::json!({
        "healthy": healthy,
        "base_url": client.display_base_url(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(if healthy { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn spawn_ctrl_c_listener(shutdown: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("interrupt received"),
            Err(signal_error) => warn!(error = %signal_error, "failed to listen for Ctrl-C"),
        }
        shutdown.cancel();
    });
}
