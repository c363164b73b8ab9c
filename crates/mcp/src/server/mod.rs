mod core;
mod errors;
mod http;
mod log_payload;
mod resources;
mod schemas;
mod stdio;
mod tools;

pub use core::N8nMcpCore;
pub use http::{MCP_PATH, McpHttpServer, RunningMcpHttpServer, resolve_bind_address};
pub use stdio::serve_stdio;
