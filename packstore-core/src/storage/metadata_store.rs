use crate::error::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::time::Duration;

/// Attributes stored alongside an entry's content. `extra_attributes` is
/// open-ended: unknown keys survive a round trip through readers that do
/// not understand them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub size: u64,
    pub timestamp: DateTime<Utc>,
    pub sha512: String,
    #[serde(rename = "sig", default)]
    pub signatures: Vec<String>,
    #[serde(flatten, default)]
    pub extra_attributes: Map<String, Value>,
}

/// SQLite-backed index of store entries, one row per file path. The full
/// metadata object is kept as an inline JSON payload next to the columns
/// used for lookups.
pub struct MetadataStore {
    db_path: PathBuf,
}

impl MetadataStore {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self { db_path };
        store.init_schema()?;
        Ok(store)
    }

    fn get_conn(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS store_entries (
                pk INTEGER PRIMARY KEY AUTOINCREMENT,
                path TEXT NOT NULL UNIQUE,
                size_bytes INTEGER NOT NULL,
                sha512 TEXT NOT NULL,
                inline_meta BLOB NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_store_entries_path
             ON store_entries(path)",
            [],
        )?;

        Ok(())
    }

    pub fn upsert_entry(&self, path: &str, meta: &EntryMetadata) -> Result<()> {
        let inline_meta = serde_json::to_vec(meta)?;
        let conn = self.get_conn()?;

        conn.execute(
            "INSERT INTO store_entries (path, size_bytes, sha512, inline_meta, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(path) DO UPDATE SET
                size_bytes = excluded.size_bytes,
                sha512 = excluded.sha512,
                inline_meta = excluded.inline_meta,
                updated_at = excluded.updated_at",
            params![
                path,
                meta.size as i64,
                meta.sha512,
                inline_meta,
                meta.timestamp.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    pub fn get_entry(&self, path: &str) -> Result<Option<EntryMetadata>> {
        let conn = self.get_conn()?;

        let inline: Option<Vec<u8>> = conn
            .query_row(
                "SELECT inline_meta FROM store_entries WHERE path = ?1",
                params![path],
                |row| row.get(0),
            )
            .optional()?;

        match inline {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn exists(&self, path: &str) -> Result<bool> {
        let conn = self.get_conn()?;

        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM store_entries WHERE path = ?1",
                params![path],
                |row| row.get(0),
            )
            .optional()?;

        Ok(found.is_some())
    }

    /// True when any entry lives strictly below `dir_path` (the empty
    /// string addresses the store root).
    pub fn has_children(&self, dir_path: &str) -> Result<bool> {
        let conn = self.get_conn()?;
        let pattern = Self::child_pattern(dir_path);

        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM store_entries WHERE path LIKE ?1 LIMIT 1",
                params![pattern],
                |row| row.get(0),
            )
            .optional()?;

        Ok(found.is_some())
    }

    /// All entries below `dir_path` (any depth), ordered by path.
    pub fn list_under(&self, dir_path: &str) -> Result<Vec<(String, EntryMetadata)>> {
        let conn = self.get_conn()?;
        let pattern = Self::child_pattern(dir_path);

        let mut stmt = conn.prepare(
            "SELECT path, inline_meta FROM store_entries
             WHERE path LIKE ?1
             ORDER BY path ASC",
        )?;

        let mut rows = stmt.query(params![pattern])?;
        let mut entries = Vec::new();

        while let Some(row) = rows.next()? {
            let path: String = row.get(0)?;
            let inline: Vec<u8> = row.get(1)?;
            entries.push((path, serde_json::from_slice(&inline)?));
        }

        Ok(entries)
    }

    pub fn remove_entry(&self, path: &str) -> Result<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM store_entries WHERE path = ?1",
            params![path],
        )?;
        Ok(affected > 0)
    }

    /// Removes every entry below `dir_path`; returns how many were removed.
    pub fn remove_prefix(&self, dir_path: &str) -> Result<usize> {
        let conn = self.get_conn()?;
        let pattern = Self::child_pattern(dir_path);
        let affected = conn.execute(
            "DELETE FROM store_entries WHERE path LIKE ?1",
            params![pattern],
        )?;
        Ok(affected)
    }

    fn child_pattern(dir_path: &str) -> String {
        if dir_path.is_empty() {
            "%".to_string()
        } else {
            format!("{}/%", dir_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity::compute_hash;

    fn meta_for(body: &[u8]) -> EntryMetadata {
        EntryMetadata {
            size: body.len() as u64,
            timestamp: Utc::now(),
            sha512: compute_hash(body),
            signatures: vec!["sig-one".to_string()],
            extra_attributes: Map::new(),
        }
    }

    fn open_store(dir: &tempfile::TempDir) -> MetadataStore {
        MetadataStore::new(dir.path().join("metadata.db")).unwrap()
    }

    #[test]
    fn upsert_and_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let meta = meta_for(b"payload");
        store.upsert_entry("configs/a.jar", &meta).unwrap();

        let loaded = store.get_entry("configs/a.jar").unwrap().unwrap();
        assert_eq!(loaded.sha512, meta.sha512);
        assert_eq!(loaded.size, 7);
        assert_eq!(loaded.signatures, vec!["sig-one".to_string()]);
        assert!(store.get_entry("configs/missing.jar").unwrap().is_none());
    }

    #[test]
    fn upsert_replaces_existing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        store.upsert_entry("a.bin", &meta_for(b"one")).unwrap();
        store.upsert_entry("a.bin", &meta_for(b"two!")).unwrap();

        let loaded = store.get_entry("a.bin").unwrap().unwrap();
        assert_eq!(loaded.size, 4);
        assert_eq!(loaded.sha512, compute_hash(b"two!"));
    }

    #[test]
    fn unknown_extra_attributes_survive_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let json = format!(
            r#"{{"size":3,"timestamp":"2026-01-01T00:00:00Z","sha512":"{}","sig":[],"package":"my-plugin","release":7}}"#,
            compute_hash(b"abc")
        );
        let meta: EntryMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(meta.extra_attributes.len(), 2);

        store.upsert_entry("plugins/p.jar", &meta).unwrap();
        let loaded = store.get_entry("plugins/p.jar").unwrap().unwrap();
        assert_eq!(
            loaded.extra_attributes.get("package").unwrap(),
            &Value::String("my-plugin".to_string())
        );
        assert_eq!(loaded.extra_attributes.get("release").unwrap(), &Value::from(7));
    }

    #[test]
    fn prefix_queries_and_removal() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        store.upsert_entry("a/b/c.bin", &meta_for(b"1")).unwrap();
        store.upsert_entry("a/d.bin", &meta_for(b"2")).unwrap();
        store.upsert_entry("e.bin", &meta_for(b"3")).unwrap();

        assert!(store.has_children("a").unwrap());
        assert!(store.has_children("a/b").unwrap());
        assert!(!store.has_children("e.bin").unwrap());
        assert!(store.has_children("").unwrap());

        let under_a = store.list_under("a").unwrap();
        assert_eq!(under_a.len(), 2);
        assert_eq!(under_a[0].0, "a/b/c.bin");

        assert_eq!(store.remove_prefix("a").unwrap(), 2);
        assert!(!store.has_children("a").unwrap());
        assert!(store.exists("e.bin").unwrap());

        assert!(store.remove_entry("e.bin").unwrap());
        assert!(!store.remove_entry("e.bin").unwrap());
    }
}
