//! In-memory object store — test double for the pipeline and API tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use super::object::{ObjectStore, StoreError, TagSet};

/// In-memory `ObjectStore`. Keys map to (body, content_type) pairs with a
/// separate tag map, mirroring the body/tag split of the real store.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<String, (Vec<u8>, String)>>,
    tags: Mutex<BTreeMap<String, TagSet>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.lock().expect("store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for MemoryObjectStore {
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let objects = self.objects.lock().expect("store mutex poisoned");
        Ok(objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let objects = self.objects.lock().expect("store mutex poisoned");
        objects
            .get(key)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StoreError> {
        let mut objects = self.objects.lock().expect("store mutex poisoned");
        objects.insert(key.to_string(), (bytes.to_vec(), content_type.to_string()));
        Ok(())
    }

    fn get_tags(&self, key: &str) -> Result<TagSet, StoreError> {
        let objects = self.objects.lock().expect("store mutex poisoned");
        if !objects.contains_key(key) {
            return Err(StoreError::NotFound(key.to_string()));
        }
        let tags = self.tags.lock().expect("store mutex poisoned");
        Ok(tags.get(key).cloned().unwrap_or_default())
    }

    fn put_tags(&self, key: &str, new_tags: &TagSet) -> Result<(), StoreError> {
        let objects = self.objects.lock().expect("store mutex poisoned");
        if !objects.contains_key(key) {
            return Err(StoreError::NotFound(key.to_string()));
        }
        let mut tags = self.tags.lock().expect("store mutex poisoned");
        tags.insert(key.to_string(), new_tags.clone());
        Ok(())
    }
}
