use packstore_core::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub node: NodeConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub node_id: String,
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Address peers use to reach this node; usually equal to `bind_addr`
    /// unless the node sits behind a mapped port.
    pub advertise_addr: String,
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterConfig {
    #[serde(default)]
    pub peers: Vec<PeerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerConfig {
    pub node_id: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_per_node_timeout_ms")]
    pub per_node_timeout_ms: u64,
    #[serde(default = "default_fetch_workers")]
    pub fetch_workers: usize,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            per_node_timeout_ms: default_per_node_timeout_ms(),
            fetch_workers: default_fetch_workers(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_per_node_timeout_ms() -> u64 {
    5000
}

fn default_fetch_workers() -> usize {
    4
}

fn default_request_timeout_ms() -> u64 {
    10000
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name(path))
            .add_source(::config::Environment::with_prefix("PACKSTORE"))
            .build()
            .map_err(|e| StoreError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| StoreError::Config(e.to_string()))?;

        Ok(config)
    }
}
