//! Connection settings for the n8n REST API.
//!
//! Settings are read once at startup, validated, and frozen. Raw values are
//! gathered into [`RawSettings`] (one optional string per environment
//! variable) and converted with [`ConnectionSettings::try_from`]. Validation
//! fails closed: a malformed value is an error, never a silent default.

use std::env;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use n8n_mcp_util::REDACTED;
use thiserror::Error;
use tracing::warn;
use url::{Host, Url};

pub const ENV_API_URL: &str = "N8N_API_URL";
pub const ENV_API_KEY: &str = "N8N_API_KEY";
pub const ENV_USERNAME: &str = "N8N_USERNAME";
pub const ENV_PASSWORD: &str = "N8N_PASSWORD";
pub const ENV_REQUEST_TIMEOUT: &str = "REQUEST_TIMEOUT";
pub const ENV_MAX_RETRIES: &str = "MAX_RETRIES";
pub const ENV_VALIDATE_SSL: &str = "VALIDATE_SSL";
pub const ENV_MAX_RESPONSE_SIZE: &str = "MAX_RESPONSE_SIZE";
pub const ENV_MAX_REQUEST_SIZE: &str = "MAX_REQUEST_SIZE";
pub const ENV_ALLOWED_HOSTS: &str = "N8N_ALLOWED_HOSTS";
pub const ENV_ALLOW_INSECURE_HTTP: &str = "N8N_ALLOW_INSECURE_HTTP";

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const MIN_TIMEOUT_MS: u64 = 1_000;
pub const MAX_TIMEOUT_MS: u64 = 300_000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const MAX_RETRIES_LIMIT: u32 = 10;
pub const DEFAULT_MAX_RESPONSE_SIZE: u64 = 10 * 1024 * 1024;
pub const DEFAULT_MAX_REQUEST_SIZE: u64 = 5 * 1024 * 1024;

/// Errors raised while validating configuration or building the HTTP transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting '{name}'")]
    MissingValue { name: String },

    #[error("Invalid URL in '{name}': {reason}")]
    InvalidUrl { name: String, reason: String },

    #[error("Insecure transport: '{scheme}://' is only allowed for loopback hosts, got '{host}'. Use https or set N8N_ALLOW_INSECURE_HTTP=true")]
    InsecureTransport { scheme: String, host: String },

    #[error("Unsupported URL scheme '{scheme}' (expected http or https)")]
    UnsupportedScheme { scheme: String },

    #[error("Invalid number in '{name}': '{value}'")]
    InvalidNumber { name: String, value: String },

    #[error("Invalid boolean in '{name}': '{value}' (expected true or false)")]
    InvalidBoolean { name: String, value: String },

    #[error("Invalid value in '{name}': {reason}")]
    InvalidValue { name: String, reason: String },

    #[error("Host '{host}' is not in the allowed hosts list: {allowed}")]
    HostNotAllowed { host: String, allowed: String },

    #[error("Failed to build HTTP client: {reason}")]
    HttpClient { reason: String },
}

/// Unvalidated settings, one optional string per environment variable.
///
/// Empty strings are treated the same as missing values.
#[derive(Clone, Default)]
pub struct RawSettings {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub request_timeout: Option<String>,
    pub max_retries: Option<String>,
    pub validate_ssl: Option<String>,
    pub max_response_size: Option<String>,
    pub max_request_size: Option<String>,
    pub allowed_hosts: Option<String>,
    pub allow_insecure_http: Option<String>,
}

impl RawSettings {
    /// Collect raw values through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            api_url: lookup(ENV_API_URL),
            api_key: lookup(ENV_API_KEY),
            username: lookup(ENV_USERNAME),
            password: lookup(ENV_PASSWORD),
            request_timeout: lookup(ENV_REQUEST_TIMEOUT),
            max_retries: lookup(ENV_MAX_RETRIES),
            validate_ssl: lookup(ENV_VALIDATE_SSL),
            max_response_size: lookup(ENV_MAX_RESPONSE_SIZE),
            max_request_size: lookup(ENV_MAX_REQUEST_SIZE),
            allowed_hosts: lookup(ENV_ALLOWED_HOSTS),
            allow_insecure_http: lookup(ENV_ALLOW_INSECURE_HTTP),
        }
    }
}

impl fmt::Debug for RawSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawSettings")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("request_timeout", &self.request_timeout)
            .field("max_retries", &self.max_retries)
            .field("validate_ssl", &self.validate_ssl)
            .field("max_response_size", &self.max_response_size)
            .field("max_request_size", &self.max_request_size)
            .field("allowed_hosts", &self.allowed_hosts)
            .field("allow_insecure_http", &self.allow_insecure_http)
            .finish()
    }
}

/// Validated, immutable connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    base_url: Url,
    api_key: Option<String>,
    username: Option<String>,
    password: Option<String>,
    timeout: Duration,
    max_retries: u32,
    validate_ssl: bool,
    max_response_size: u64,
    max_request_size: u64,
    allowed_hosts: Vec<String>,
    allow_insecure_http: bool,
}

impl ConnectionSettings {
    /// Load and validate settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load and validate settings through an injected lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::try_from(RawSettings::from_lookup(lookup))
    }

    /// Base URL of the REST API, for example `https://n8n.example.com/api/v1`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    pub fn api_base(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Host component of the base URL.
    pub fn host(&self) -> &str {
        self.base_url.host_str().unwrap_or_default()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Username and password for HTTP basic auth, when both are configured.
    pub fn basic_credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some((username.as_str(), password.as_str())),
            _ => None,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn validate_ssl(&self) -> bool {
        self.validate_ssl
    }

    pub fn max_response_size(&self) -> u64 {
        self.max_response_size
    }

    pub fn max_request_size(&self) -> u64 {
        self.max_request_size
    }

    /// Lowercased host allow-list. Empty means every host is allowed.
    pub fn allowed_hosts(&self) -> &[String] {
        &self.allowed_hosts
    }

    pub fn allow_insecure_http(&self) -> bool {
        self.allow_insecure_http
    }

    /// Whether the configured host is one of `localhost`, `127.0.0.1` or `::1`.
    pub fn is_loopback(&self) -> bool {
        is_loopback_host(&self.base_url)
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("base_url", &n8n_mcp_util::sanitize_url(self.base_url.as_str()))
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("validate_ssl", &self.validate_ssl)
            .field("max_response_size", &self.max_response_size)
            .field("max_request_size", &self.max_request_size)
            .field("allowed_hosts", &self.allowed_hosts)
            .field("allow_insecure_http", &self.allow_insecure_http)
            .finish()
    }
}

impl TryFrom<RawSettings> for ConnectionSettings {
    type Error = ConfigError;

    fn try_from(raw: RawSettings) -> Result<Self, Self::Error> {
        let allow_insecure_http = parse_bool(ENV_ALLOW_INSECURE_HTTP, raw.allow_insecure_http.as_deref())?.unwrap_or(false);

        let api_url = non_empty(raw.api_url.as_deref()).ok_or_else(|| ConfigError::MissingValue {
            name: ENV_API_URL.to_string(),
        })?;
        let base_url = validate_api_url(api_url, allow_insecure_http)?;

        let timeout_ms = clamp_number(
            ENV_REQUEST_TIMEOUT,
            parse_number(ENV_REQUEST_TIMEOUT, raw.request_timeout.as_deref())?.unwrap_or(DEFAULT_TIMEOUT_MS),
            MIN_TIMEOUT_MS,
            MAX_TIMEOUT_MS,
        );
        let max_retries = clamp_number(
            ENV_MAX_RETRIES,
            parse_number(ENV_MAX_RETRIES, raw.max_retries.as_deref())?.unwrap_or(u64::from(DEFAULT_MAX_RETRIES)),
            0,
            u64::from(MAX_RETRIES_LIMIT),
        );
        let max_response_size = positive_size(
            ENV_MAX_RESPONSE_SIZE,
            parse_number(ENV_MAX_RESPONSE_SIZE, raw.max_response_size.as_deref())?.unwrap_or(DEFAULT_MAX_RESPONSE_SIZE),
        )?;
        let max_request_size = positive_size(
            ENV_MAX_REQUEST_SIZE,
            parse_number(ENV_MAX_REQUEST_SIZE, raw.max_request_size.as_deref())?.unwrap_or(DEFAULT_MAX_REQUEST_SIZE),
        )?;
        let validate_ssl = parse_bool(ENV_VALIDATE_SSL, raw.validate_ssl.as_deref())?.unwrap_or(true);
        if !validate_ssl {
            warn!("TLS certificate validation is disabled (VALIDATE_SSL=false)");
        }

        let allowed_hosts = non_empty(raw.allowed_hosts.as_deref())
            .map(|hosts| {
                hosts
                    .split(',')
                    .map(|host| host.trim().to_ascii_lowercase())
                    .filter(|host| !host.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let api_key = non_empty(raw.api_key.as_deref()).map(str::to_string);
        let username = non_empty(raw.username.as_deref()).map(str::to_string);
        let password = non_empty(raw.password.as_deref()).map(str::to_string);
        if api_key.is_none() && username.is_some() != password.is_some() {
            warn!("both N8N_USERNAME and N8N_PASSWORD are required for basic auth; requests will be unauthenticated");
        }

        Ok(Self {
            base_url,
            api_key,
            username,
            password,
            timeout: Duration::from_millis(timeout_ms),
            // Clamped to MAX_RETRIES_LIMIT above.
            max_retries: max_retries as u32,
            validate_ssl,
            max_response_size,
            max_request_size,
            allowed_hosts,
            allow_insecure_http,
        })
    }
}

/// Validate the API base URL against the transport security policy.
///
/// Rules:
/// - the URL must parse and include a host
/// - `https` is always accepted
/// - `http` is accepted for loopback hosts, or for any host when the insecure
///   opt-in is set (logged loudly)
/// - every other scheme is rejected
pub fn validate_api_url(raw: &str, allow_insecure_http: bool) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|error| ConfigError::InvalidUrl {
        name: ENV_API_URL.to_string(),
        reason: error.to_string(),
    })?;

    let Some(host) = url.host_str() else {
        return Err(ConfigError::InvalidUrl {
            name: ENV_API_URL.to_string(),
            reason: "URL must include a host".to_string(),
        });
    };

    match url.scheme() {
        "https" => Ok(url),
        "http" if is_loopback_host(&url) => Ok(url),
        "http" if allow_insecure_http => {
            warn!(
                host,
                "plain HTTP to a non-loopback host was explicitly allowed; credentials and workflow data travel unencrypted"
            );
            Ok(url)
        }
        "http" => Err(ConfigError::InsecureTransport {
            scheme: "http".to_string(),
            host: host.to_string(),
        }),
        other => Err(ConfigError::UnsupportedScheme { scheme: other.to_string() }),
    }
}

fn is_loopback_host(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(address)) => address == Ipv4Addr::LOCALHOST,
        Some(Host::Ipv6(address)) => address == Ipv6Addr::LOCALHOST,
        None => false,
    }
}

/// Trim a raw value and treat the empty string as unset.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Parse an optional unsigned integer setting.
pub fn parse_number(name: &str, value: Option<&str>) -> Result<Option<u64>, ConfigError> {
    non_empty(value)
        .map(|value| {
            value.parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                name: name.to_string(),
                value: value.to_string(),
            })
        })
        .transpose()
}

/// Parse an optional boolean setting (`true`/`false`, `1`/`0`, `yes`/`no`).
pub fn parse_bool(name: &str, value: Option<&str>) -> Result<Option<bool>, ConfigError> {
    let Some(value) = non_empty(value) else {
        return Ok(None);
    };
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidBoolean {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

fn clamp_number(name: &str, value: u64, min: u64, max: u64) -> u64 {
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!(setting = name, requested = value, applied = clamped, "setting out of range; clamped");
    }
    clamped
}

fn positive_size(name: &str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: "size limit must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
