//! Server configuration.
//!
//! Settings come from an optional TOML file, then the command line. Every
//! field has a default, so a file only needs the keys it wants to change:
//!
//! ```toml
//! port = 9000
//! read_timeout = 2.5
//!
//! [concurrency]
//! mode = "bounded"
//! workers = 16
//! ```

use clap::Parser;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to deserialize config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// How accepted connections are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ConcurrencyPolicy {
    /// One task per connection, no admission control.
    #[default]
    Unbounded,
    /// A fixed set of worker tasks fed through a queue of the same size.
    /// Accepting pauses while the queue is full.
    Bounded { workers: usize },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub buffer_size: usize,

    /// Upper bound on the time a client may take to send the request head.
    #[serde(deserialize_with = "deserialize_duration")]
    pub read_timeout: Duration,

    pub server_name: String,

    /// Answer unparsable requests with an error page instead of silently
    /// closing the connection.
    pub reply_on_parse_error: bool,

    pub concurrency: ConcurrencyPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 8080,
            buffer_size: 4096,

            read_timeout: Duration::from_secs(15),

            server_name: "rustyhttp/0.1".to_string(),

            reply_on_parse_error: false,

            concurrency: ConcurrencyPolicy::Unbounded,
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid("buffer_size must be >= 1".to_string()));
        }
        if self.read_timeout.is_zero() {
            return Err(ConfigError::Invalid("read_timeout must be > 0".to_string()));
        }
        if let ConcurrencyPolicy::Bounded { workers: 0 } = self.concurrency {
            return Err(ConfigError::Invalid(
                "bounded concurrency needs at least one worker".to_string(),
            ));
        }
        Ok(())
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}

/// Command line of the `rustyhttp` binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "rustyhttp", version, about = "Minimal HTTP/1.1 server")]
pub struct CliArgs {
    /// TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on, overrides the config file
    #[arg(short, long, env = "RUSTYHTTP_PORT")]
    pub port: Option<u16>,

    /// Log filter, e.g. `info` or `rustyhttp=debug`
    #[arg(long, default_value = "info", env = "RUSTYHTTP_LOG")]
    pub log_level: String,
}

impl CliArgs {
    /// Loads the config file, if any, and applies command line overrides.
    pub fn load_config(&self) -> Result<ServerConfig, ConfigError> {
        let config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };
        Ok(self.apply(config))
    }

    pub fn apply(&self, mut config: ServerConfig) -> ServerConfig {
        if let Some(port) = self.port {
            config.port = port;
        }
        config
    }
}
