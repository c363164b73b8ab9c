//! Process-level server settings.
//!
//! Connection settings for the remote platform live in
//! [`n8n_mcp_api::config`]. This module only covers how the server itself is
//! hosted: the HTTP port and the log verbosity.

use std::env;
use std::fmt;
use std::str::FromStr;

use n8n_mcp_api::ConfigError;
use n8n_mcp_api::config::{non_empty, parse_number};

pub const ENV_PORT: &str = "PORT";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

pub const DEFAULT_PORT: u16 = 3000;

/// Verbosity accepted in `LOG_LEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter())
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(ConfigError::InvalidValue {
                name: ENV_LOG_LEVEL.to_string(),
                reason: format!("'{other}' is not one of debug, info, warn, error"),
            }),
        }
    }
}

/// Validated hosting settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerSettings {
    port: u16,
    log_level: LogLevel,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            log_level: LogLevel::default(),
        }
    }
}

impl ServerSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port_value = lookup(ENV_PORT);
        let port = match parse_number(ENV_PORT, port_value.as_deref())? {
            None => DEFAULT_PORT,
            Some(port) => u16::try_from(port)
                .ok()
                .filter(|port| *port > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    name: ENV_PORT.to_string(),
                    reason: format!("{port} is not a valid TCP port"),
                })?,
        };

        let level_value = lookup(ENV_LOG_LEVEL);
        let log_level = match non_empty(level_value.as_deref()) {
            Some(level) => level.parse()?,
            None => LogLevel::default(),
        };

        Ok(Self { port, log_level })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }
}
