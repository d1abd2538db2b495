//! Server configuration.
//!
//! Defaults, optionally overlaid by a YAML file, then by the `LISTEN` and
//! `ROOT` environment variables. Command-line flags are applied on top by
//! the binary.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// How long a connection may take to deliver its header block
    pub idle_timeout_ms: u64,
    /// Cap on the buffered request header block
    pub max_request_bytes: usize,
    /// Value of the `Server` response header
    pub server_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub root: PathBuf,
    pub chunk_size: usize,
    pub traversal: TraversalPolicy,
}

/// What to do with a request that resolves outside the root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalPolicy {
    /// Serve the root directory in its place.
    #[default]
    ServeRoot,
    /// Answer 403 Forbidden.
    Reject,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8888,
            idle_timeout_ms: 2000,
            max_request_bytes: 16 * 1024,
            server_name: "Directory Listing Server".to_string(),
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            chunk_size: crate::http::body::DEFAULT_CHUNK_SIZE,
            traversal: TraversalPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// `bind_address:port`, bracketing IPv6 literals.
    pub fn listen_addr(&self) -> String {
        if self.bind_address.contains(':') && !self.bind_address.starts_with('[') {
            format!("[{}]:{}", self.bind_address, self.port)
        } else {
            format!("{}:{}", self.bind_address, self.port)
        }
    }
}

impl Config {
    /// Defaults overlaid with the environment.
    pub fn load() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a struct.
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Applies `LISTEN` (`host:port`) and `ROOT` when set.
    pub fn apply_env(&mut self) {
        if let Ok(listen) = std::env::var("LISTEN") {
            match listen.parse::<SocketAddr>() {
                Ok(addr) => {
                    self.server.bind_address = addr.ip().to_string();
                    self.server.port = addr.port();
                }
                Err(_) => tracing::warn!(listen = %listen, "Ignoring malformed LISTEN"),
            }
        }
        if let Ok(root) = std::env::var("ROOT") {
            self.static_files.root = PathBuf::from(root);
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.server.idle_timeout_ms)
    }
}
