//! The object-store contract: durable bodies plus a mutable tag set.

use std::collections::BTreeMap;

use thiserror::Error;

/// Tag set attached to a stored object. Ordered so sidecar files and test
/// assertions are stable.
pub type TagSet = BTreeMap<String, String>;

/// Errors from object-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("I/O error for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed object {key}: {detail}")]
    Malformed { key: String, detail: String },
}

/// Durable object store with queryable tag metadata.
///
/// Mirrors the serving deployment's store contract: bodies are immutable
/// once written; the tag set is replaced as a whole by `put_tags`. There is
/// no conditional write — callers read-modify-write the tag set and accept
/// the lost-update window between two concurrent writers.
pub trait ObjectStore: Send + Sync {
    /// List all object keys under a prefix, sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Read an object body.
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Write an object body. Overwrites silently.
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StoreError>;

    /// Read the tag set. An existing object with no tags yields an empty set.
    fn get_tags(&self, key: &str) -> Result<TagSet, StoreError>;

    /// Replace the whole tag set of an existing object.
    fn put_tags(&self, key: &str, tags: &TagSet) -> Result<(), StoreError>;
}
