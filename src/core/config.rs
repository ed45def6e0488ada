//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables (optionally via a `.env` file) or defaults.

use super::error::{Error, Result};
use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Public Mem0 platform endpoint.
pub const DEFAULT_MEM0_BASE_URL: &str = "https://api.mem0.ai";

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Mem0 API access.
    pub mem0: Mem0Config,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Configuration for the Mem0 API.
#[derive(Clone, Serialize, Deserialize)]
pub struct Mem0Config {
    /// API token sent as `Authorization: Token <key>`.
    /// A missing key is not fatal at startup; every tool call reports it instead.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Base URL all endpoint paths are appended to, without a trailing slash.
    pub base_url: String,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for Mem0Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mem0Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Default for Mem0Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_MEM0_BASE_URL.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "mem0".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                with_timestamps: true,
            },
            transport: TransportConfig::default(),
            mem0: Mem0Config::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// Server settings use the `MCP_` prefix (`MCP_SERVER_NAME`, `MCP_LOG_LEVEL`,
    /// `MCP_LOG_TIMESTAMPS`, `MCP_TRANSPORT`); the API settings are
    /// `MEM0_API_KEY` and `MEM0_API_BASE_URL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(timestamps) = std::env::var("MCP_LOG_TIMESTAMPS") {
            config.logging.with_timestamps = timestamps.parse().unwrap_or(true);
        }

        config.transport = TransportConfig::from_env();

        config.mem0.api_key = std::env::var("MEM0_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        if let Ok(base_url) = std::env::var("MEM0_API_BASE_URL") {
            config.mem0.base_url = base_url.trim_end_matches('/').to_string();
        }

        config
    }

    /// Log the effective Mem0 settings. Call once logging is initialized.
    pub fn log_summary(&self) {
        info!("Mem0 API base URL: {}", self.mem0.base_url);
        if self.mem0.api_key.is_some() {
            info!("Mem0 API key loaded from environment");
        } else {
            warn!(
                "MEM0_API_KEY not found in environment variables. \
                 Tool calls will fail until it is set."
            );
        }
    }

    /// Check settings that would make every request fail.
    ///
    /// The API key is deliberately not checked here: its absence is reported per call.
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.mem0.base_url).map_err(|e| {
            Error::config(format!(
                "Invalid Mem0 base URL '{}': {}",
                self.mem0.base_url, e
            ))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "Mem0 base URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        Ok(())
    }
}
