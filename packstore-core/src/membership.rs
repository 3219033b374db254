//! Cluster membership for the sync coordinator.
//!
//! Provides a trait-based abstraction so a coordination backend can be
//! plugged in; the shipped implementation is a static view seeded from
//! configuration.

use crate::error::Result;
use crate::node::NodeInfo;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Trait for membership providers.
#[async_trait]
pub trait ClusterMembership: Send + Sync {
    /// Register (or refresh) a node in the cluster view.
    async fn register_node(&self, node: &NodeInfo) -> Result<()>;

    /// Get all live nodes, the local node included.
    async fn get_nodes(&self) -> Result<Vec<NodeInfo>>;
}

/// Membership seeded from a static peer list.
pub struct StaticMembership {
    nodes: RwLock<Vec<NodeInfo>>,
}

impl StaticMembership {
    pub fn new(seed: Vec<NodeInfo>) -> Self {
        Self {
            nodes: RwLock::new(seed),
        }
    }
}

#[async_trait]
impl ClusterMembership for StaticMembership {
    async fn register_node(&self, node: &NodeInfo) -> Result<()> {
        let mut nodes = self.nodes.write().await;
        if let Some(existing) = nodes.iter_mut().find(|n| n.node_id == node.node_id) {
            *existing = node.clone();
        } else {
            nodes.push(node.clone());
        }
        Ok(())
    }

    async fn get_nodes(&self) -> Result<Vec<NodeInfo>> {
        Ok(self.nodes.read().await.clone())
    }
}
