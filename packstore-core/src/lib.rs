//! Packstore core - per-node store for cluster-shared binary artifacts,
//! kept consistent across nodes by peer-to-peer push/pull replication with
//! SHA-512 integrity verification.

pub mod cluster;
pub mod error;
pub mod filestore;
pub mod integrity;
pub mod membership;
pub mod node;
pub mod path;
pub mod storage;
pub mod sync;

pub use cluster::PeerClient;
pub use error::{Result, StoreError};
pub use filestore::{FileDetails, FileKind, FileStore, NamePredicate, WriteRequest};
pub use integrity::{compute_hash, verify_hash};
pub use membership::{ClusterMembership, StaticMembership};
pub use node::{Node, NodeInfo, NodeStatus};
pub use path::{normalize_parent_path, normalize_store_path, split_parent};
pub use storage::{ContentStore, EntryMetadata, MetadataStore};
pub use sync::{FetchHandle, SyncCoordinator, SyncOptions, SyncReport};
