//! Offline asset cache.
//!
//! A versioned, cache-first controller for every asset request a page makes.
//!
//! # Module Structure
//!
//! - `manifest` - compiled-in generation name and precache set
//! - `request` / `response` - request identity and captured responses
//! - `storage` - cache generations (in memory or on disk)
//! - `network` - the network collaborator
//! - `manager` - install / activate / fetch state machine
//! - `host` - registration on startup, retried on the next start

pub mod error;
pub mod host;
pub mod manager;
pub mod manifest;
pub mod network;
pub mod request;
pub mod response;
pub mod storage;

pub use host::{Registration, register};
pub use manager::{CacheManager, LifecycleState};
pub use manifest::Manifest;
pub use network::HttpNetwork;
pub use request::Request;
pub use response::Response;
pub use storage::{CacheStorage, DiskStorage, MemoryStorage};
