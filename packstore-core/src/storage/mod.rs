//! Storage modules for packstore.
//!
//! Provides on-disk content storage and SQLite-backed entry metadata.

pub mod content_store;
pub mod metadata_store;

pub use content_store::ContentStore;
pub use metadata_store::{EntryMetadata, MetadataStore};
