//! `[cache]` section configuration.
//!
//! ```toml
//! [cache]
//! dir = ".ll-toolbox/cache"   # Relative to the config file
//! backend = "disk"            # "disk" persists across restarts, "memory" does not
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Disk,
    Memory,
}

/// Offline cache storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub dir: PathBuf,
    pub backend: CacheBackend,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".ll-toolbox/cache"),
            backend: CacheBackend::Disk,
        }
    }
}
