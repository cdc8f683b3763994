//! In-process cache storage.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use super::{CacheStorage, CacheStore};
use crate::offline::error::StorageError;
use crate::offline::request::RequestKey;
use crate::offline::response::Response;

/// Generations held in memory, lost when the process exits.
#[derive(Default)]
pub struct MemoryStorage {
    caches: DashMap<String, Arc<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>, StorageError> {
        let store = self
            .caches
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryStore::default()))
            .clone();
        Ok(store)
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.caches.iter().map(|e| e.key().clone()).collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.caches.remove(name).is_some())
    }

    async fn has(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.caches.contains_key(name))
    }
}

/// A single in-memory generation.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<RequestKey, Response>,
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn lookup(&self, key: &RequestKey) -> Result<Option<Response>, StorageError> {
        Ok(self.entries.get(key).map(|r| r.clone()))
    }

    async fn put(&self, key: RequestKey, response: Response) -> Result<(), StorageError> {
        self.entries.insert(key, response);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<RequestKey>, StorageError> {
        Ok(self.entries.iter().map(|e| e.key().clone()).collect())
    }

    async fn len(&self) -> Result<usize, StorageError> {
        Ok(self.entries.len())
    }
}
