use crate::error::{Result, StoreError};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// ContentStore keeps entry bytes on disk under `files/{store path}`.
/// Writes go to a temp sibling first and are renamed into place, so a
/// concurrent reader sees either the old or the new content in full.
pub struct ContentStore {
    base_path: PathBuf,
}

impl ContentStore {
    pub fn new(base_path: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(base_path.join("files"))?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Absolute location for a normalized store path.
    pub fn file_path(&self, path: &str) -> PathBuf {
        let mut full = self.base_path.join("files");
        for component in path.split('/') {
            full.push(component);
        }
        full
    }

    pub async fn put(&self, path: &str, data: &Bytes) -> Result<PathBuf> {
        let file_path = self.file_path(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let tmp_path = file_path.with_extension(format!("{}.tmp", ulid::Ulid::new()));
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp_path, &file_path).await?;
        Ok(file_path)
    }

    pub async fn get(&self, path: &str) -> Result<Bytes> {
        let file_path = self.file_path(path);
        if !file_path.is_file() {
            return Err(StoreError::NotFound(path.to_string()));
        }

        let bytes = fs::read(file_path).await?;
        Ok(Bytes::from(bytes))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.file_path(path).is_file()
    }

    pub async fn remove_file(&self, path: &str) -> Result<()> {
        let file_path = self.file_path(path);
        if file_path.is_file() {
            fs::remove_file(file_path).await?;
        }
        Ok(())
    }

    pub async fn remove_dir(&self, path: &str) -> Result<()> {
        let dir_path = self.file_path(path);
        if dir_path.is_dir() {
            fs::remove_dir_all(dir_path).await?;
        }
        Ok(())
    }
}
