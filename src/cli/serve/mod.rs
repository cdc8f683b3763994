//! Offline-first HTTP front for an origin.
//!
//! ```text
//! browser ──► tiny_http ──► CacheManager::handle_fetch ──► cache / origin
//! ```
//!
//! Registration (install, then activate) runs before the first request is
//! accepted. Requests arriving while it is incomplete still work; they just
//! go straight to the network.

mod forward;
mod lifecycle;
mod response;

use crate::{
    cli::cache::open_storage,
    config::ToolboxConfig,
    debug, log,
    offline::{self, CacheManager, HttpNetwork, Manifest, Registration},
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tiny_http::{Request, Server};
use tokio::runtime::Handle;
use url::Url;

/// Run the server until Ctrl+C.
pub fn serve(config: &ToolboxConfig) -> Result<()> {
    let origin = config.origin()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let manifest = Manifest::for_origin(&origin).context("failed to resolve precache set")?;
    let network = HttpNetwork::new(origin.clone(), config.serve.timeout())
        .context("failed to build HTTP client")?;
    let manager = Arc::new(CacheManager::new(
        manifest,
        open_storage(config),
        Arc::new(network),
    ));

    match runtime.block_on(offline::register(&manager)) {
        Registration::Installed { precached, purged } => {
            debug!("serve"; "fresh install: {} assets, {} stale removed", precached, purged.len());
        }
        Registration::Resumed { purged } => {
            debug!("serve"; "resumed stored generation, {} stale removed", purged.len());
        }
        Registration::Failed => log!("serve"; "offline cache unavailable, passing through"),
    }

    let (server, addr) =
        lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    crate::core::register_server(Arc::clone(&server));
    log!("serve"; "http://{} -> {}", addr, origin);

    run_request_loop(&server, runtime.handle(), &manager, &origin);

    manager.terminate();
    runtime.shutdown_timeout(std::time::Duration::from_secs(2));
    Ok(())
}

fn run_request_loop(server: &Server, runtime: &Handle, manager: &Arc<CacheManager>, origin: &Url) {
    for request in server.incoming_requests() {
        let manager = Arc::clone(manager);
        let origin = origin.clone();
        let handle = runtime.clone();
        // tiny_http IO is blocking; keep it off the async workers.
        runtime.spawn_blocking(move || {
            if let Err(e) = handle_request(request, &handle, &manager, &origin) {
                log!("serve"; "request error: {e}");
            }
        });
    }
}

/// Handle a single HTTP request
fn handle_request(
    mut request: Request,
    runtime: &Handle,
    manager: &CacheManager,
    origin: &Url,
) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let forwarded = match forward::forward(&mut request, origin) {
        Ok(forwarded) => forwarded,
        Err(e) => return response::respond_bad_request(request, &e),
    };

    match runtime.block_on(manager.handle_fetch(&forwarded)) {
        Ok(relayed) => {
            debug!("serve"; "{} {} -> {}", forwarded.method(), forwarded.url(), relayed.status);
            response::respond_relayed(request, relayed)
        }
        Err(e) => {
            log!("serve"; "{} {} failed: {}", forwarded.method(), forwarded.url(), e);
            response::respond_bad_gateway(request, &e)
        }
    }
}
