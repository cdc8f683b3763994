//! Lazily loaded codecs, one per format.
//!
//! A codec is loaded on first use and kept for the life of the registry.
//! Concurrent first requests for the same format share one load. A failed
//! load leaves the slot empty so a later request tries again.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::OnceCell;

use super::codec::{self, Codec};
use super::error::EncodeError;
use super::format::ImageFormat;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct LoadError(String);

impl LoadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Produces a ready codec for a format.
#[async_trait]
pub trait CodecLoader: Send + Sync {
    async fn load(&self, format: ImageFormat) -> Result<Arc<dyn Codec>, LoadError>;
}

/// Loads the codecs compiled into this binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinLoader;

#[async_trait]
impl CodecLoader for BuiltinLoader {
    async fn load(&self, format: ImageFormat) -> Result<Arc<dyn Codec>, LoadError> {
        crate::debug!("codec"; "loading {}", format.codec_name());
        Ok(Arc::from(codec::builtin(format)))
    }
}

type Slot = Arc<OnceCell<Arc<dyn Codec>>>;

pub struct CodecRegistry {
    loader: Arc<dyn CodecLoader>,
    slots: DashMap<ImageFormat, Slot>,
}

impl CodecRegistry {
    pub fn new(loader: Arc<dyn CodecLoader>) -> Self {
        Self {
            loader,
            slots: DashMap::new(),
        }
    }

    /// The codec for `format`, loading it if this is the first use.
    pub async fn get(&self, format: ImageFormat) -> Result<Arc<dyn Codec>, EncodeError> {
        // Clone the slot out so the map shard is not held across the await.
        let slot = self.slots.entry(format).or_default().clone();
        let codec = slot
            .get_or_try_init(|| self.loader.load(format))
            .await
            .map_err(|e| EncodeError::Load {
                codec: format.codec_name(),
                message: e.to_string(),
            })?;
        Ok(codec.clone())
    }

    pub fn is_loaded(&self, format: ImageFormat) -> bool {
        self.slots
            .get(&format)
            .is_some_and(|slot| slot.initialized())
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new(Arc::new(BuiltinLoader))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counts loads and can be told to fail the next ones.
    #[derive(Default)]
    pub(crate) struct CountingLoader {
        pub loads: AtomicUsize,
        pub failures_left: AtomicUsize,
        pub delay: Option<Duration>,
    }

    #[async_trait]
    impl CodecLoader for CountingLoader {
        async fn load(&self, format: ImageFormat) -> Result<Arc<dyn Codec>, LoadError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let failing = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(LoadError::new("module not found"));
            }
            Ok(Arc::from(codec::builtin(format)))
        }
    }

    #[tokio::test]
    async fn test_loaded_once() {
        let loader = Arc::new(CountingLoader::default());
        let registry = CodecRegistry::new(loader.clone());

        assert!(!registry.is_loaded(ImageFormat::Png));
        let a = registry.get(ImageFormat::Png).await.unwrap();
        let b = registry.get(ImageFormat::Png).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(registry.is_loaded(ImageFormat::Png));
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);

        registry.get(ImageFormat::Jpeg).await.unwrap();
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_first_use_shares_load() {
        let loader = Arc::new(CountingLoader {
            delay: Some(Duration::from_millis(20)),
            ..Default::default()
        });
        let registry = Arc::new(CodecRegistry::new(loader.clone()));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.get(ImageFormat::Avif).await.map(|_| ()) })
            })
            .collect();
        for task in futures::future::join_all(tasks).await {
            task.unwrap().unwrap();
        }
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let loader = Arc::new(CountingLoader {
            failures_left: AtomicUsize::new(1),
            ..Default::default()
        });
        let registry = CodecRegistry::new(loader.clone());

        let err = registry.get(ImageFormat::Webp).await.err().unwrap();
        assert_eq!(err.to_string(), "Failed to load codec webp: module not found");
        assert!(!registry.is_loaded(ImageFormat::Webp));

        registry.get(ImageFormat::Webp).await.unwrap();
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_builtin_formats_match() {
        let registry = CodecRegistry::default();
        for format in ImageFormat::ALL {
            assert_eq!(registry.get(format).await.unwrap().format(), format);
        }
    }
}
