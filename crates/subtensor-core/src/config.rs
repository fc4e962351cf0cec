//! Client configuration.
//!
//! A [`ClientConfig`] names either a network from the catalog or an explicit
//! chain endpoint. An explicit endpoint overrides the network. With the
//! `persistence` feature the configuration can be loaded from and saved to the
//! platform config directory as JSON.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::{BLOCK_TIME_SECS, Network};

/// Configuration error type.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization/deserialization error.
    #[cfg(feature = "persistence")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Neither a network nor a chain endpoint is configured.
    #[error("Invalid client config: chain_endpoint and network are both unset")]
    NoTarget,
    /// Other configuration error.
    #[error("{0}")]
    Other(String),
}

/// What a client connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectTarget {
    /// A single `host:port` address. Never fails over.
    Endpoint(String),
    /// A catalog network; candidates are tried until one answers.
    Network(Network),
}

impl std::fmt::Display for ConnectTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectTarget::Endpoint(endpoint) => write!(f, "endpoint {}", endpoint),
            ConnectTarget::Network(network) => write!(f, "network {}", network),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Selected network.
    #[serde(default = "default_network")]
    pub network: Option<Network>,
    /// Explicit `host:port` endpoint. Overrides `network` when set.
    #[serde(default)]
    pub chain_endpoint: Option<String>,
    /// Expected block production interval in seconds.
    #[serde(default = "default_block_time_secs")]
    pub block_time_secs: u64,
    /// Bound on a single endpoint connection attempt in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_network() -> Option<Network> {
    Some(Network::Kusanagi)
}

fn default_block_time_secs() -> u64 {
    BLOCK_TIME_SECS
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            chain_endpoint: None,
            block_time_secs: default_block_time_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl ClientConfig {
    pub fn for_network(network: Network) -> Self {
        Self {
            network: Some(network),
            ..Self::default()
        }
    }

    pub fn for_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            chain_endpoint: Some(endpoint.into()),
            ..Self::default()
        }
    }

    /// Resolve the connection target. The explicit endpoint wins.
    pub fn target(&self) -> Result<ConnectTarget, ConfigError> {
        let endpoint = self
            .chain_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty());
        match (endpoint, self.network) {
            (Some(endpoint), _) => Ok(ConnectTarget::Endpoint(endpoint.to_string())),
            (None, Some(network)) => Ok(ConnectTarget::Network(network)),
            (None, None) => Err(ConfigError::NoTarget),
        }
    }

    pub fn block_time(&self) -> Duration {
        Duration::from_secs(self.block_time_secs)
    }

    /// How long a submission waits for inclusion or finalization.
    pub fn submission_timeout(&self) -> Duration {
        self.block_time() * 3
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(feature = "persistence")]
pub use persistence::*;

#[cfg(feature = "persistence")]
mod persistence {
    use super::{ClientConfig, ConfigError};
    use directories::ProjectDirs;
    use std::fs;
    use std::path::PathBuf;

    /// Get the config directory.
    pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
        ProjectDirs::from("com", "bittensor", "subtensor-client")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| ConfigError::Other("Could not determine config directory".to_string()))
    }

    /// Get the config file path.
    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        get_config_dir().map(|dir| dir.join("client.json"))
    }

    impl ClientConfig {
        /// Load configuration from disk, falling back to defaults when absent.
        pub fn load() -> Result<Self, ConfigError> {
            Self::load_from(&get_config_path()?)
        }

        pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
            if !path.exists() {
                return Ok(Self::default());
            }
            let content = fs::read_to_string(path)?;
            let config = serde_json::from_str(&content)?;
            Ok(config)
        }

        /// Save configuration to disk.
        pub fn save(&self) -> Result<(), ConfigError> {
            self.save_to(&get_config_path()?)
        }

        pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let content = serde_json::to_string_pretty(self)?;
            fs::write(path, content)?;
            Ok(())
        }
    }
}
