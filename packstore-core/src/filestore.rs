use crate::error::{Result, StoreError};
use crate::integrity;
use crate::path::{normalize_parent_path, normalize_store_path};
use crate::storage::{ContentStore, EntryMetadata, MetadataStore};
use bytes::Bytes;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Classification of a store path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
    Missing,
}

/// One row of a directory listing. Directories are derived from deeper
/// entry paths and carry no metadata of their own.
#[derive(Debug, Clone)]
pub struct FileDetails {
    pub name: String,
    pub directory: bool,
    pub metadata: Option<EntryMetadata>,
}

#[derive(Debug, Clone, Default)]
pub struct WriteRequest {
    pub body: Bytes,
    pub signatures: Vec<String>,
    pub extra_attributes: Map<String, Value>,
}

pub type NamePredicate<'a> = &'a (dyn Fn(&str) -> bool + Send + Sync);

/// Node-local store of cluster-shared artifacts: content bytes on disk,
/// metadata in SQLite, one write lock per path.
pub struct FileStore {
    content: ContentStore,
    metadata: MetadataStore,
    write_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FileStore {
    pub fn open(data_dir: PathBuf) -> Result<Self> {
        let content = ContentStore::new(data_dir.clone())?;
        let metadata = MetadataStore::new(data_dir.join("metadata.db"))?;

        Ok(Self {
            content,
            metadata,
            write_locks: Mutex::new(HashMap::new()),
        })
    }

    async fn lock_path(&self, path: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.write_locks.lock().await;
            locks
                .entry(path.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Classifies `path`: an exact entry is a File, a proper prefix of
    /// stored entries (or the empty root) is a Directory, anything else is
    /// Missing.
    pub async fn resolve_type(&self, path: &str) -> Result<FileKind> {
        let path = normalize_parent_path(path)?;
        if path.is_empty() {
            return Ok(FileKind::Directory);
        }
        if self.metadata.exists(&path)? {
            return Ok(FileKind::File);
        }
        if self.metadata.has_children(&path)? {
            return Ok(FileKind::Directory);
        }
        Ok(FileKind::Missing)
    }

    /// Stores `request.body` at `path`, hashing the content and replacing
    /// any previous entry as one atomic unit. Writes to the same path are
    /// serialized; last committer wins.
    pub async fn write(&self, path: &str, request: WriteRequest) -> Result<EntryMetadata> {
        let path = normalize_store_path(path)?;
        self.ensure_writable(&path)?;

        let _guard = self.lock_path(&path).await;

        let meta = EntryMetadata {
            size: request.body.len() as u64,
            timestamp: Utc::now(),
            sha512: integrity::compute_hash(&request.body),
            signatures: request.signatures,
            extra_attributes: request.extra_attributes,
        };

        self.content.put(&path, &request.body).await?;
        self.metadata.upsert_entry(&path, &meta)?;

        Ok(meta)
    }

    /// Returns the metadata and full content of a stored file, or
    /// `NotFound` when the path is absent.
    pub async fn read(&self, path: &str) -> Result<(EntryMetadata, Bytes)> {
        let path = normalize_store_path(path)?;

        let meta = self
            .metadata
            .get_entry(&path)?
            .ok_or_else(|| StoreError::NotFound(path.clone()))?;
        let body = self.content.get(&path).await?;

        Ok((meta, body))
    }

    pub async fn metadata_of(&self, path: &str) -> Result<Option<EntryMetadata>> {
        let path = normalize_store_path(path)?;
        self.metadata.get_entry(&path)
    }

    /// Immediate children of a directory whose simple name satisfies the
    /// predicate (all of them when no predicate is given). An absent or
    /// empty directory yields an empty Vec, never an error.
    pub async fn list(
        &self,
        parent: &str,
        predicate: Option<NamePredicate<'_>>,
    ) -> Result<Vec<FileDetails>> {
        let parent = normalize_parent_path(parent)?;
        let records = self.metadata.list_under(&parent)?;

        let skip = if parent.is_empty() {
            0
        } else {
            parent.len() + 1
        };

        let mut seen_dirs: HashSet<String> = HashSet::new();
        let mut details = Vec::new();

        for (path, meta) in records {
            let rest = &path[skip..];
            match rest.find('/') {
                Some(idx) => {
                    let dir_name = &rest[..idx];
                    if !seen_dirs.insert(dir_name.to_string()) {
                        continue;
                    }
                    if predicate.map_or(true, |accept| accept(dir_name)) {
                        details.push(FileDetails {
                            name: dir_name.to_string(),
                            directory: true,
                            metadata: None,
                        });
                    }
                }
                None => {
                    if predicate.map_or(true, |accept| accept(rest)) {
                        details.push(FileDetails {
                            name: rest.to_string(),
                            directory: false,
                            metadata: Some(meta),
                        });
                    }
                }
            }
        }

        Ok(details)
    }

    /// Removes the entry at `path` (and, for a directory, every
    /// descendant) from this node only. Peers are not told.
    pub async fn delete_local(&self, path: &str) -> Result<()> {
        let path = normalize_store_path(path)?;
        let _guard = self.lock_path(&path).await;

        if self.metadata.exists(&path)? {
            self.content.remove_file(&path).await?;
            self.metadata.remove_entry(&path)?;
            return Ok(());
        }

        if self.metadata.has_children(&path)? {
            self.content.remove_dir(&path).await?;
            self.metadata.remove_prefix(&path)?;
            return Ok(());
        }

        Err(StoreError::NotFound(path))
    }

    /// A path cannot be written where an ancestor is already a file, or
    /// where the path itself is an existing directory.
    fn ensure_writable(&self, path: &str) -> Result<()> {
        for (idx, ch) in path.char_indices() {
            if ch == '/' && self.metadata.exists(&path[..idx])? {
                return Err(StoreError::InvalidPath(format!(
                    "{} is a file, not a directory",
                    &path[..idx]
                )));
            }
        }

        if self.metadata.has_children(path)? {
            return Err(StoreError::InvalidPath(format!(
                "{} is a directory",
                path
            )));
        }

        Ok(())
    }
}
