//! `[serve]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"              # Network interface (127.0.0.1 = localhost only)
//! port = 5277                          # HTTP port number
//! origin = "http://localhost:8000/"    # Site whose assets are cached
//! timeout_secs = 30                    # Per-request network timeout
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Offline-first server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Origin every request is forwarded to. Also the cache scope.
    pub origin: String,

    /// Network timeout per request, in seconds.
    pub timeout_secs: u64,
}

impl ServeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 5277,
            origin: "http://localhost:8000/".to_string(),
            timeout_secs: 30,
        }
    }
}
