//! Process configuration, read once from the environment at startup.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use stencil_storage::S3Options;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 50051;
pub const DEFAULT_BUCKET: &str = "stencil";

/// Environment variable names.
pub mod vars {
    pub const HOST: &str = "STENCIL_HOST";
    pub const GRPC_PORT: &str = "STENCIL_GRPC_PORT";
    pub const REQUEST_TIMEOUT_SECS: &str = "STENCIL_REQUEST_TIMEOUT_SECS";
    pub const STORE: &str = "STENCIL_STORE";
    pub const BUCKET: &str = "STENCIL_BUCKET";
    pub const S3_ENDPOINT: &str = "STENCIL_S3_ENDPOINT";
    pub const REGION: &str = "AWS_REGION";
    pub const LOG_FORMAT: &str = "STENCIL_LOG_FORMAT";
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(format!("expected 'json' or 'pretty', got '{other}'")),
        }
    }
}

/// Which document store backs the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local; contents are lost on exit.
    Memory,
    S3(S3Options),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub request_timeout: Option<Duration>,
    pub store: StoreBackend,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            request_timeout: None,
            store: StoreBackend::S3(S3Options {
                bucket: DEFAULT_BUCKET.to_string(),
                region: None,
                endpoint_url: None,
            }),
            log_format: LogFormat::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Unset and blank variables
    /// take their defaults; malformed ones are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let host = match var(vars::HOST) {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::invalid(vars::HOST, &raw, "not an IP address"))?,
            None => defaults.host,
        };

        let port = match var(vars::GRPC_PORT) {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::invalid(vars::GRPC_PORT, &raw, "not a port number"))?,
            None => defaults.port,
        };

        let request_timeout = match var(vars::REQUEST_TIMEOUT_SECS) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(ConfigError::invalid(
                        vars::REQUEST_TIMEOUT_SECS,
                        &raw,
                        "expected a positive number of seconds",
                    ));
                }
            },
            None => None,
        };

        let store = match var(vars::STORE).as_deref().map(str::to_ascii_lowercase) {
            Some(kind) if kind == "memory" => StoreBackend::Memory,
            Some(kind) if kind != "s3" => {
                return Err(ConfigError::invalid(
                    vars::STORE,
                    &kind,
                    "expected 's3' or 'memory'",
                ));
            }
            _ => StoreBackend::S3(S3Options {
                bucket: var(vars::BUCKET).unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
                region: var(vars::REGION),
                endpoint_url: var(vars::S3_ENDPOINT),
            }),
        };

        let log_format = match var(vars::LOG_FORMAT) {
            Some(raw) => raw
                .parse()
                .map_err(|reason: String| ConfigError::invalid(vars::LOG_FORMAT, &raw, reason))?,
            None => defaults.log_format,
        };

        Ok(Self {
            host,
            port,
            request_timeout,
            store,
            log_format,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
