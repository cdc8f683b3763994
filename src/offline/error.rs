//! Error types for the offline cache.

use std::path::PathBuf;

use thiserror::Error;

use super::LifecycleState;

/// Cache storage failures.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error at `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("corrupt cache entry `{0}`")]
    Corrupt(PathBuf, #[source] serde_json::Error),

    #[error("cache storage task failed: {0}")]
    Task(String),
}

/// Network failures: the request produced no response at all.
#[derive(Debug, Error, Clone)]
pub enum NetError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("request to {0} timed out")]
    Timeout(String),

    #[error("no route to {0}")]
    Offline(String),
}

impl NetError {
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        match error.url().map(ToString::to_string) {
            Some(url) if error.is_timeout() => Self::Timeout(url),
            Some(url) if error.is_connect() => Self::Offline(url),
            _ => Self::Http(error.to_string()),
        }
    }
}

/// Install transition failures. Nothing is written when install fails.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("cannot install from state {0:?}")]
    InvalidState(LifecycleState),

    #[error("precache fetch of {url} failed")]
    Fetch {
        url: String,
        #[source]
        source: NetError,
    },

    #[error("precache fetch of {url} returned status {status}")]
    BadStatus { url: String, status: u16 },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Activate transition failures.
#[derive(Debug, Error)]
pub enum ActivateError {
    #[error("cannot activate from state {0:?}")]
    InvalidState(LifecycleState),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// An intercepted fetch that yields no response.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Network(#[from] NetError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
