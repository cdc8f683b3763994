//! Host side of the lifecycle: what a browser does on each page load.

use super::manager::{CacheManager, LifecycleState};
use crate::log;

/// Outcome of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// Freshly installed and activated.
    Installed { precached: usize, purged: Vec<String> },
    /// The stored generation was already complete; activated without fetching.
    Resumed { purged: Vec<String> },
    /// Install or activation failed; requests pass through uncontrolled
    /// until the next load retries.
    Failed,
}

/// Bring `manager` to `Active`, installing the current generation if needed.
///
/// Failures are logged, never propagated: an absent offline capability is
/// the only visible effect, and the next registration retries.
pub async fn register(manager: &CacheManager) -> Registration {
    let generation = manager.manifest().generation().to_string();

    let precached = match manager.resume_installed().await {
        Ok(true) => None,
        Ok(false) => match manager.install().await {
            Ok(count) => Some(count),
            Err(e) => {
                log!("install"; "{} failed, will retry on next start: {}", generation, e);
                return Registration::Failed;
            }
        },
        Err(e) => {
            log!("install"; "{}: {}", generation, e);
            return Registration::Failed;
        }
    };

    match manager.activate().await {
        Ok(purged) => {
            debug_assert_eq!(manager.state(), LifecycleState::Active);
            log!("activate"; "{} controls all requests", generation);
            match precached {
                Some(precached) => Registration::Installed { precached, purged },
                None => Registration::Resumed { purged },
            }
        }
        Err(e) => {
            log!("activate"; "{} failed: {}", generation, e);
            Registration::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline::error::NetError;
    use crate::offline::manifest::Manifest;
    use crate::offline::network::Network;
    use crate::offline::request::Request;
    use crate::offline::response::Response;
    use crate::offline::storage::DiskStorage;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tempfile::TempDir;
    use url::Url;

    /// Serves every URL with its own path as body, unless switched offline.
    #[derive(Default)]
    struct EchoNetwork {
        offline: AtomicBool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Network for EchoNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, NetError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                return Err(NetError::Offline(request.url().to_string()));
            }
            Ok(Response::new(200, request.url().path().to_string()))
        }
    }

    fn manager(generation: &str, root: &std::path::Path, net: &Arc<EchoNetwork>) -> CacheManager {
        let origin = Url::parse("https://tools.example/").unwrap();
        let manifest = Manifest::new(
            generation,
            origin.clone(),
            &origin.join("assets/sw.js").unwrap(),
            &["./css/style.css", "../../index.html"],
        )
        .unwrap();
        CacheManager::new(manifest, Arc::new(DiskStorage::new(root)), net.clone())
    }

    #[tokio::test]
    async fn test_register_then_restart_offline() {
        let dir = TempDir::new().unwrap();
        let net = Arc::new(EchoNetwork::default());

        let first = manager("v1", dir.path(), &net);
        assert_eq!(
            register(&first).await,
            Registration::Installed { precached: 2, purged: vec![] }
        );

        // process restart with no network: the persisted generation is adopted
        net.offline.store(true, Ordering::SeqCst);
        let second = manager("v1", dir.path(), &net);
        assert_eq!(register(&second).await, Registration::Resumed { purged: vec![] });

        let index = Url::parse("https://tools.example/index.html").unwrap();
        let response = second.handle_fetch(&Request::get(index)).await.unwrap();
        assert_eq!(&response.body[..], b"/index.html");
    }

    #[tokio::test]
    async fn test_new_generation_supersedes_old() {
        let dir = TempDir::new().unwrap();
        let net = Arc::new(EchoNetwork::default());
        register(&manager("v1", dir.path(), &net)).await;

        let next = manager("v2", dir.path(), &net);
        assert_eq!(
            register(&next).await,
            Registration::Installed { precached: 2, purged: vec!["v1".to_string()] }
        );
        assert_eq!(next.storage().keys().await.unwrap(), ["v2"]);
    }

    #[tokio::test]
    async fn test_failed_install_retries_next_time() {
        let dir = TempDir::new().unwrap();
        let net = Arc::new(EchoNetwork::default());
        net.offline.store(true, Ordering::SeqCst);

        let first = manager("v1", dir.path(), &net);
        assert_eq!(register(&first).await, Registration::Failed);
        assert_eq!(first.state(), LifecycleState::Uninstalled);

        net.offline.store(false, Ordering::SeqCst);
        let second = manager("v1", dir.path(), &net);
        assert!(matches!(register(&second).await, Registration::Installed { .. }));
        assert_eq!(second.state(), LifecycleState::Active);
    }
}
