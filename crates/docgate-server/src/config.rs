//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::dispatch::DEFAULT_WORKERS;

/// Default request body limit (25 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Default per-call backend timeout.
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Gateway settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Accepted bearer tokens.
    pub api_tokens: Vec<String>,
    /// Worker pool size.
    pub workers: usize,
    /// Per-call backend timeout; `None` disables it.
    pub backend_timeout: Option<Duration>,
    pub max_upload_bytes: usize,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            api_tokens: Vec::new(),
            workers: DEFAULT_WORKERS,
            backend_timeout: Some(DEFAULT_BACKEND_TIMEOUT),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `DOCGATE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(host) = var("DOCGATE_HOST") {
            config.host = host;
        }

        if let Some(port) = var("DOCGATE_PORT") {
            config.port = parse("DOCGATE_PORT", "a valid port number", &port)?;
        }

        if let Some(tokens) = var("DOCGATE_API_TOKENS") {
            config.api_tokens = tokens
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(workers) = var("DOCGATE_WORKERS") {
            let workers: usize = parse("DOCGATE_WORKERS", "a positive integer", &workers)?;
            if workers == 0 {
                return Err(ConfigError::Invalid {
                    name: "DOCGATE_WORKERS",
                    expected: "a positive integer",
                    value: "0".to_string(),
                });
            }
            config.workers = workers;
        }

        if let Some(secs) = var("DOCGATE_BACKEND_TIMEOUT_SECS") {
            let secs: u64 = parse("DOCGATE_BACKEND_TIMEOUT_SECS", "a number of seconds", &secs)?;
            config.backend_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(bytes) = var("DOCGATE_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = parse("DOCGATE_MAX_UPLOAD_BYTES", "a byte count", &bytes)?;
        }

        if let Some(format) = var("DOCGATE_LOG_FORMAT") {
            config.log_format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" | "text" => LogFormat::Pretty,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "DOCGATE_LOG_FORMAT",
                        expected: "`json` or `pretty`",
                        value: format,
                    })
                }
            };
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::Invalid {
            name: "DOCGATE_HOST",
            expected: "an IP address",
            value: self.host.clone(),
        })
    }
}

fn parse<T: std::str::FromStr>(
    name: &'static str,
    expected: &'static str,
    value: &str,
) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        name,
        expected,
        value: value.to_string(),
    })
}
