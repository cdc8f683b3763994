//! Cache lifecycle state machine.
//!
//! ```text
//! Uninstalled ──install──► Installing ──ok──► Installed ──activate──► Activating ──► Active
//!      ▲                       │                                                     │
//!      └────────fail───────────┘                                        terminate ──► Terminated
//! ```
//!
//! While `Active`, every cacheable request is answered cache-first; misses
//! go to the network and verified responses are inserted into the active
//! generation. In any other state requests pass straight through.

use std::sync::Arc;

use futures::future::try_join_all;
use parking_lot::Mutex;

use super::error::{ActivateError, FetchError, InstallError};
use super::manifest::Manifest;
use super::network::Network;
use super::request::{Request, RequestKey};
use super::response::Response;
use super::storage::{CacheStorage, CacheStore};
use crate::{debug, log};

/// Lifecycle states of the cache controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninstalled,
    Installing,
    Installed,
    Activating,
    Active,
    Terminated,
}

/// Owns one versioned cache generation and mediates every asset fetch.
pub struct CacheManager {
    manifest: Manifest,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    state: Mutex<LifecycleState>,
}

impl CacheManager {
    pub fn new(
        manifest: Manifest,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self {
            manifest,
            storage,
            network,
            state: Mutex::new(LifecycleState::Uninstalled),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock()
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// Move `from → to` atomically; false if the current state is not `from`.
    fn transition(&self, from: LifecycleState, to: LifecycleState) -> bool {
        let mut state = self.state.lock();
        if *state != from {
            return false;
        }
        *state = to;
        true
    }

    fn set_state(&self, to: LifecycleState) {
        *self.state.lock() = to;
    }

    // =========================================================================
    // Install
    // =========================================================================

    /// Fetch every precache asset and store them in the current generation.
    ///
    /// All-or-nothing: if any fetch fails or returns a non-2xx status,
    /// nothing is written and the manager returns to `Uninstalled`.
    pub async fn install(&self) -> Result<usize, InstallError> {
        use LifecycleState::{Installed, Installing, Uninstalled};

        if !self.transition(Uninstalled, Installing) {
            return Err(InstallError::InvalidState(self.state()));
        }

        match self.precache().await {
            Ok(count) => {
                self.set_state(Installed);
                log!("install"; "{}: precached {} assets", self.manifest.generation(), count);
                Ok(count)
            }
            Err(e) => {
                self.set_state(Uninstalled);
                Err(e)
            }
        }
    }

    async fn precache(&self) -> Result<usize, InstallError> {
        let fetches = self.manifest.precache().iter().map(|url| async move {
            let request = Request::get(url.clone());
            let response =
                self.network
                    .fetch(&request)
                    .await
                    .map_err(|source| InstallError::Fetch {
                        url: url.to_string(),
                        source,
                    })?;
            if !response.ok() {
                return Err(InstallError::BadStatus {
                    url: url.to_string(),
                    status: response.status,
                });
            }
            Ok((request.key(), response))
        });

        let entries = try_join_all(fetches).await?;
        let count = entries.len();

        let generation = self.manifest.generation();
        let existed = self.storage.has(generation).await?;
        let store = self.storage.open(generation).await?;
        if let Err(e) = store.put_all(entries).await {
            // A generation this install created must not outlive it.
            if !existed && let Err(cleanup) = self.storage.delete(generation).await {
                log!("error"; "failed to remove partial cache {}: {}", generation, cleanup);
            }
            return Err(e.into());
        }
        Ok(count)
    }

    /// Adopt a generation installed by a previous run without refetching.
    ///
    /// Succeeds only if every precache asset is already stored.
    pub async fn resume_installed(&self) -> Result<bool, InstallError> {
        use LifecycleState::{Installed, Uninstalled};

        if self.state() != Uninstalled {
            return Err(InstallError::InvalidState(self.state()));
        }
        if !self.storage.has(self.manifest.generation()).await? {
            return Ok(false);
        }

        let store = self.storage.open(self.manifest.generation()).await?;
        for url in self.manifest.precache() {
            if store.lookup(&Request::get(url.clone()).key()).await?.is_none() {
                debug!("install"; "stored generation is missing {}", url);
                return Ok(false);
            }
        }
        Ok(self.transition(Uninstalled, Installed))
    }

    // =========================================================================
    // Activate
    // =========================================================================

    /// Delete every stale generation, then start controlling requests.
    ///
    /// Returns the names of the deleted generations.
    pub async fn activate(&self) -> Result<Vec<String>, ActivateError> {
        use LifecycleState::{Activating, Active, Installed};

        if !self.transition(Installed, Activating) {
            return Err(ActivateError::InvalidState(self.state()));
        }

        match self.purge_stale().await {
            Ok(deleted) => {
                self.set_state(Active);
                for name in &deleted {
                    log!("activate"; "deleted stale cache {}", name);
                }
                Ok(deleted)
            }
            Err(e) => {
                self.set_state(Installed);
                Err(e)
            }
        }
    }

    async fn purge_stale(&self) -> Result<Vec<String>, ActivateError> {
        let current = self.manifest.generation();
        let mut deleted = Vec::new();
        for name in self.storage.keys().await? {
            if name != current && self.storage.delete(&name).await? {
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    // =========================================================================
    // Fetch interception
    // =========================================================================

    /// Answer a page request.
    ///
    /// `Err` means the page observes a failed fetch; no fallback is
    /// substituted.
    pub async fn handle_fetch(&self, request: &Request) -> Result<Response, FetchError> {
        if self.state() != LifecycleState::Active || !request.is_cacheable() {
            return Ok(self.network.fetch(request).await?);
        }

        let key = request.key();
        let store = self.storage.open(self.manifest.generation()).await?;

        if let Some(hit) = store.lookup(&key).await? {
            debug!("fetch"; "hit {}", key);
            return Ok(hit);
        }

        let response = match self.network.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                debug!("fetch"; "miss {} and network failed: {}", key, e);
                return Err(e.into());
            }
        };

        if !response.is_runtime_cacheable() {
            debug!("fetch"; "pass {} ({} {:?})", key, response.status, response.kind);
            return Ok(response);
        }

        self.insert(store.as_ref(), key, response.clone()).await;
        Ok(response)
    }

    /// Runtime insert. Failure only loses the offline copy.
    async fn insert(&self, store: &dyn CacheStore, key: RequestKey, response: Response) {
        let label = key.to_string();
        match store.put(key, response).await {
            Ok(()) => debug!("fetch"; "cached {}", label),
            Err(e) => log!("cache"; "failed to cache {}: {}", label, e),
        }
    }

    // =========================================================================
    // Terminate
    // =========================================================================

    /// Stop controlling requests. The stored generation is kept.
    pub fn terminate(&self) {
        self.set_state(LifecycleState::Terminated);
    }
}
