//! Replication across cluster nodes: push (sync-to-all) and pull (fetch).
//!
//! There is no cross-node transaction anywhere here. A node that misses a
//! push keeps serving stale or absent data until the next sync or an
//! on-demand fetch.

use crate::cluster::PeerClient;
use crate::error::{Result, StoreError};
use crate::filestore::{FileKind, FileStore, WriteRequest};
use crate::integrity;
use crate::membership::ClusterMembership;
use crate::path::normalize_store_path;
use crate::storage::EntryMetadata;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Budget for each peer's fetch-trigger dispatch during a sync.
    pub per_node_timeout: Duration,
    /// Concurrent fetch downloads; extra fetches queue for a slot instead
    /// of spawning unbounded work.
    pub fetch_workers: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            per_node_timeout: Duration::from_secs(5),
            fetch_workers: 4,
        }
    }
}

/// Outcome of the dispatch phase of a sync.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub dispatched: usize,
    pub unreachable: Vec<String>,
}

/// Handle to an in-flight fetch. Await it for the outcome, drop it to let
/// the download finish on its own, or `abort` to cancel the task.
pub struct FetchHandle {
    task: JoinHandle<Result<EntryMetadata>>,
}

impl FetchHandle {
    pub async fn join(self) -> Result<EntryMetadata> {
        self.task
            .await
            .map_err(|error| StoreError::Internal(format!("fetch task failed: {}", error)))?
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Orchestrates replication of store entries between this node and its
/// peers.
pub struct SyncCoordinator {
    file_store: Arc<FileStore>,
    membership: Arc<dyn ClusterMembership>,
    client: PeerClient,
    local_address: String,
    per_node_timeout: Duration,
    fetch_slots: Arc<Semaphore>,
}

impl SyncCoordinator {
    pub fn new(
        file_store: Arc<FileStore>,
        membership: Arc<dyn ClusterMembership>,
        client: PeerClient,
        local_address: String,
        options: SyncOptions,
    ) -> Self {
        Self {
            file_store,
            membership,
            client,
            local_address,
            per_node_timeout: options.per_node_timeout,
            fetch_slots: Arc::new(Semaphore::new(options.fetch_workers.max(1))),
        }
    }

    /// Pushes `path` to every live cluster node by asking each to pull it
    /// from this node. Dispatches run in parallel, each under its own
    /// timeout, so one slow peer cannot stall the others. Best-effort: the
    /// call waits for every trigger to be acked or fail, logs per-node
    /// failures, and never errors because peers are down. Each peer
    /// downloads asynchronously after acking.
    pub async fn sync_to_all_nodes(&self, path: &str) -> Result<SyncReport> {
        let path = normalize_store_path(path)?;
        if self.file_store.resolve_type(&path).await? != FileKind::File {
            return Err(StoreError::NotFound(path));
        }

        let nodes = self.membership.get_nodes().await?;
        let mut dispatches = Vec::new();

        for node in nodes {
            if node.address == self.local_address {
                continue;
            }

            let client = self.client.clone();
            let path = path.clone();
            let source = self.local_address.clone();
            let per_node_timeout = self.per_node_timeout;

            dispatches.push(tokio::spawn(async move {
                let dispatch = tokio::time::timeout(
                    per_node_timeout,
                    client.trigger_fetch(&node.address, &path, &source),
                )
                .await;

                match dispatch {
                    Ok(Ok(())) => Ok(node.address),
                    Ok(Err(error)) => Err((node.address, error.to_string())),
                    Err(_) => Err((node.address, "dispatch timed out".to_string())),
                }
            }));
        }

        let mut report = SyncReport {
            dispatched: 0,
            unreachable: Vec::new(),
        };

        for dispatch in dispatches {
            match dispatch.await {
                Ok(Ok(_)) => report.dispatched += 1,
                Ok(Err((address, reason))) => {
                    tracing::warn!("sync of {} to {} failed: {}", path, address, reason);
                    report.unreachable.push(address);
                }
                Err(error) => {
                    tracing::warn!("sync dispatch task for {} died: {}", path, error);
                }
            }
        }

        Ok(report)
    }

    /// Starts an asynchronous pull of `path` from `source_address` on the
    /// bounded fetch pool and returns immediately. Nothing is committed
    /// unless the downloaded bytes match the peer-advertised hash; on any
    /// failure the worker logs and discards, with no retry. The caller may
    /// await the handle or drop it; the HTTP layer drops it.
    pub fn fetch(&self, path: &str, source_address: &str) -> Result<FetchHandle> {
        let path = normalize_store_path(path)?;
        let file_store = self.file_store.clone();
        let client = self.client.clone();
        let source = source_address.to_string();
        let slots = self.fetch_slots.clone();

        let task = tokio::spawn(async move {
            let _permit = slots
                .acquire_owned()
                .await
                .map_err(|_| StoreError::Internal("fetch pool closed".to_string()))?;

            match run_fetch(&file_store, &client, &path, &source).await {
                Ok(meta) => {
                    tracing::info!("fetched {} from {}", path, source);
                    Ok(meta)
                }
                Err(error) => {
                    tracing::error!("failed to fetch {} from {}: {}", path, source, error);
                    Err(error)
                }
            }
        });

        Ok(FetchHandle { task })
    }

    /// Local read; when the entry is absent and `allow_remote_fetch` is
    /// set, tries a verified fetch from live peers (first success wins)
    /// and retries the read once.
    pub async fn read_with_fetch(
        &self,
        path: &str,
        allow_remote_fetch: bool,
    ) -> Result<(EntryMetadata, Bytes)> {
        match self.file_store.read(path).await {
            Err(StoreError::NotFound(_)) if allow_remote_fetch => {}
            other => return other,
        }

        let nodes = self.membership.get_nodes().await?;
        for node in nodes {
            if node.address == self.local_address {
                continue;
            }
            match self.fetch(path, &node.address)?.join().await {
                Ok(_) => break,
                Err(error) => {
                    tracing::warn!(
                        "on-demand fetch of {} from {} failed: {}",
                        path,
                        node.address,
                        error
                    );
                }
            }
        }

        self.file_store.read(path).await
    }
}

async fn run_fetch(
    file_store: &FileStore,
    client: &PeerClient,
    path: &str,
    source: &str,
) -> Result<EntryMetadata> {
    let remote_meta = client.fetch_metadata(source, path).await?;
    let body = client.fetch_content(source, path).await?;
    integrity::verify_hash(&body, &remote_meta.sha512)?;

    file_store
        .write(
            path,
            WriteRequest {
                body,
                signatures: remote_meta.signatures,
                extra_attributes: remote_meta.extra_attributes,
            },
        )
        .await
}
