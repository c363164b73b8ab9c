//! Model Context Protocol (MCP) server exposing the n8n REST API as tools.
//!
//! The server wraps a shared [`n8n_mcp_api::N8nClient`] in an `rmcp` tool
//! router. It can be hosted over stdio or over streamable HTTP on a loopback
//! address.

pub mod config;
pub mod server;

pub use config::{LogLevel, ServerSettings};
pub use server::{MCP_PATH, McpHttpServer, N8nMcpCore, RunningMcpHttpServer, resolve_bind_address, serve_stdio};
