//! Configuration sections.

mod cache;
mod serve;

pub use cache::{CacheBackend, CacheConfig};
pub use serve::ServeConfig;
