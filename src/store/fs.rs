//! Filesystem object store — the shipped adapter.
//!
//! Keys map to files under a data root; the tag set lives in a
//! `<key>.tags.json` sidecar so it can be read and replaced without
//! touching the body, matching the full-replace tag semantics of the
//! deployment's object store. Content type is accepted for contract
//! compatibility and not persisted.

use std::fs;
use std::path::{Path, PathBuf};

use super::object::{ObjectStore, StoreError, TagSet};

const TAG_SIDECAR_SUFFIX: &str = ".tags.json";

/// Object store backed by a directory tree.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open a store at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::Io {
            key: root.display().to_string(),
            source: e,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn tags_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}{TAG_SIDECAR_SUFFIX}"))
    }

    fn collect_keys(&self, dir: &Path, keys: &mut Vec<String>) -> std::io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                self.collect_keys(&path, keys)?;
            } else if let Ok(rel) = path.strip_prefix(&self.root) {
                let key = rel.to_string_lossy().replace('\\', "/");
                if !key.ends_with(TAG_SIDECAR_SUFFIX) {
                    keys.push(key);
                }
            }
        }
        Ok(())
    }
}

impl ObjectStore for FsObjectStore {
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        // A prefix whose directory does not exist yet is an empty listing,
        // not an error — the serving layer may not have logged anything.
        let start = self.root.join(prefix.trim_end_matches('/'));
        if start.is_dir() {
            self.collect_keys(&start, &mut keys).map_err(|e| StoreError::Io {
                key: prefix.to_string(),
                source: e,
            })?;
        }
        keys.retain(|k| k.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(key);
        fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotFound(key.to_string()),
            _ => StoreError::Io {
                key: key.to_string(),
                source: e,
            },
        })
    }

    fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<(), StoreError> {
        let path = self.object_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                key: key.to_string(),
                source: e,
            })?;
        }
        fs::write(&path, bytes).map_err(|e| StoreError::Io {
            key: key.to_string(),
            source: e,
        })
    }

    fn get_tags(&self, key: &str) -> Result<TagSet, StoreError> {
        if !self.object_path(key).is_file() {
            return Err(StoreError::NotFound(key.to_string()));
        }
        match fs::read(self.tags_path(key)) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::Malformed {
                key: key.to_string(),
                detail: format!("tag sidecar: {e}"),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TagSet::new()),
            Err(e) => Err(StoreError::Io {
                key: key.to_string(),
                source: e,
            }),
        }
    }

    fn put_tags(&self, key: &str, tags: &TagSet) -> Result<(), StoreError> {
        if !self.object_path(key).is_file() {
            return Err(StoreError::NotFound(key.to_string()));
        }
        let bytes = serde_json::to_vec_pretty(tags).map_err(|e| StoreError::Malformed {
            key: key.to_string(),
            detail: e.to_string(),
        })?;
        fs::write(self.tags_path(key), bytes).map_err(|e| StoreError::Io {
            key: key.to_string(),
            source: e,
        })
    }
}
