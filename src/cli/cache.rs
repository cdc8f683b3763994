//! `cache status` and `cache clear`.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::{
    cli::CacheAction,
    config::{CacheBackend, ToolboxConfig},
    log,
    offline::{CacheStorage, DiskStorage, MemoryStorage, manifest::GENERATION},
};

/// Storage selected by `[cache] backend`.
pub fn open_storage(config: &ToolboxConfig) -> Arc<dyn CacheStorage> {
    match config.cache.backend {
        CacheBackend::Disk => Arc::new(DiskStorage::new(config.cache_dir())),
        CacheBackend::Memory => Arc::new(MemoryStorage::new()),
    }
}

pub fn run(action: CacheAction, config: &ToolboxConfig) -> Result<()> {
    if config.cache.backend == CacheBackend::Memory {
        log!("cache"; "memory backend keeps nothing between runs");
        return Ok(());
    }

    let storage = open_storage(config);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async {
        match action {
            CacheAction::Status => {
                let report = status(storage.as_ref()).await?;
                if report.is_empty() {
                    log!("cache"; "empty ({})", config.cache_dir().display());
                }
                for line in report {
                    log!("cache"; "{}", line);
                }
            }
            CacheAction::Clear => {
                let removed = clear(storage.as_ref()).await?;
                log!("cache"; "removed {} generation(s)", removed.len());
            }
        }
        Ok(())
    })
}

/// One line per generation: name, entry count, and whether it is current.
async fn status(storage: &dyn CacheStorage) -> Result<Vec<String>> {
    let mut names = storage.keys().await?;
    names.sort();

    let mut lines = Vec::with_capacity(names.len());
    for name in names {
        let entries = storage.open(&name).await?.len().await?;
        let marker = if name == GENERATION { " (current)" } else { "" };
        lines.push(format!("{name}: {entries} entries{marker}"));
    }
    Ok(lines)
}

async fn clear(storage: &dyn CacheStorage) -> Result<Vec<String>> {
    let mut removed = Vec::new();
    for name in storage.keys().await? {
        if storage.delete(&name).await? {
            removed.push(name);
        }
    }
    Ok(removed)
}
