use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    pub node_id: String,
    pub address: String,
    pub status: NodeStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// The local node's identity. `address` is the advertise address peers use
/// to reach this node's file endpoints.
pub struct Node {
    node_id: String,
    address: String,
    info: Arc<RwLock<NodeInfo>>,
}

impl Node {
    pub fn new(node_id: String, address: String) -> Self {
        let info = NodeInfo {
            node_id: node_id.clone(),
            address: address.clone(),
            status: NodeStatus::Healthy,
        };

        Self {
            node_id,
            address,
            info: Arc::new(RwLock::new(info)),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub async fn info(&self) -> NodeInfo {
        self.info.read().await.clone()
    }

    pub async fn update_status(&self, status: NodeStatus) {
        let mut info = self.info.write().await;
        info.status = status;
    }
}
