//! Cache storage: named generations of key → response entries.
//!
//! ```text
//! CacheStorage ─┬─ "ll-toolbox-v1"  (stale, purged on activate)
//!               └─ "ll-toolbox-v2"  ── CacheStore { key → Response }
//! ```
//!
//! Backends guarantee entry-level atomicity for `lookup` and `put`;
//! overlapping writes to one key resolve last-write-wins.

mod disk;
mod memory;

pub use disk::DiskStorage;
pub use memory::MemoryStorage;

use std::sync::Arc;

use async_trait::async_trait;

use super::error::StorageError;
use super::request::RequestKey;
use super::response::Response;

/// The set of all cache generations.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a generation, creating it if absent.
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>, StorageError>;

    /// Names of every existing generation.
    async fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Delete a generation. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool, StorageError>;

    async fn has(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.keys().await?.iter().any(|k| k == name))
    }
}

/// One generation's entries.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn lookup(&self, key: &RequestKey) -> Result<Option<Response>, StorageError>;

    /// Store `response` under `key`, replacing any previous entry.
    async fn put(&self, key: RequestKey, response: Response) -> Result<(), StorageError>;

    /// Store every entry, stopping at the first failure.
    async fn put_all(&self, entries: Vec<(RequestKey, Response)>) -> Result<(), StorageError> {
        for (key, response) in entries {
            self.put(key, response).await?;
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<RequestKey>, StorageError>;

    async fn len(&self) -> Result<usize, StorageError> {
        Ok(self.keys().await?.len())
    }
}
