use crate::config::Config;
use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use packstore_core::{
    ClusterMembership, FileStore, Node, NodeInfo, NodeStatus, PeerClient, Result, StaticMembership,
    StoreError, SyncCoordinator, SyncOptions,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

mod files;
mod types;

use files::{delete_file, get_file, health, nodes, put_file};
pub(crate) use types::*;

pub struct ServerState {
    pub(crate) node: Arc<Node>,
    pub(crate) membership: Arc<dyn ClusterMembership>,
    pub(crate) file_store: Arc<FileStore>,
    pub(crate) sync: Arc<SyncCoordinator>,
}

/// Wires the store components together from configuration. Exposed so
/// integration tests can boot a node without going through the CLI.
pub fn build_state(config: &Config) -> Result<Arc<ServerState>> {
    let node = Arc::new(Node::new(
        config.node.node_id.clone(),
        config.node.advertise_addr.clone(),
    ));

    let mut seed = vec![NodeInfo {
        node_id: config.node.node_id.clone(),
        address: config.node.advertise_addr.clone(),
        status: NodeStatus::Healthy,
    }];
    for peer in &config.cluster.peers {
        seed.push(NodeInfo {
            node_id: peer.node_id.clone(),
            address: peer.address.clone(),
            status: NodeStatus::Healthy,
        });
    }
    let membership: Arc<dyn ClusterMembership> = Arc::new(StaticMembership::new(seed));

    let file_store = Arc::new(FileStore::open(config.node.data_dir.clone())?);
    let client = PeerClient::new(Duration::from_millis(config.sync.request_timeout_ms))?;
    let sync = Arc::new(SyncCoordinator::new(
        file_store.clone(),
        membership.clone(),
        client,
        config.node.advertise_addr.clone(),
        SyncOptions {
            per_node_timeout: Duration::from_millis(config.sync.per_node_timeout_ms),
            fetch_workers: config.sync.fetch_workers,
        },
    ));

    Ok(Arc::new(ServerState {
        node,
        membership,
        file_store,
        sync,
    }))
}

pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/nodes", get(nodes))
        .route(
            "/files/*path",
            get(get_file).put(put_file).delete(delete_file),
        )
        .with_state(state)
}

pub async fn run_server(config: Config) -> Result<()> {
    let state = build_state(&config)?;
    register_local_node(&state).await?;

    let app = build_router(state);
    let listener = TcpListener::bind(&config.node.bind_addr).await?;
    tracing::info!("Packstore listening on {}", config.node.bind_addr);

    axum::serve(listener, app)
        .await
        .map_err(|error| StoreError::Http(error.to_string()))?;

    Ok(())
}

pub(crate) async fn register_local_node(state: &ServerState) -> Result<()> {
    let info = state.node.info().await;
    state.membership.register_node(&info).await
}

pub(crate) fn response_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

pub(crate) fn status_string(status: &NodeStatus) -> &'static str {
    match status {
        NodeStatus::Healthy => "healthy",
        NodeStatus::Degraded => "degraded",
        NodeStatus::Unhealthy => "unhealthy",
    }
}
