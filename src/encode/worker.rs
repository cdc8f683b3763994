//! Encode worker actor.
//!
//! ```text
//! WorkerHandle --Encode/Terminate--> EncodeWorker --EncodeResponse--> receiver
//!                                       │
//!                                       └─ one task per request (JoinSet)
//! ```
//!
//! Requests run concurrently and each gets exactly one response, in
//! completion order. Terminating the worker (or dropping every handle)
//! aborts requests still in flight; they get no response.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::error::EncodeError;
use super::format::ImageFormat;
use super::message::{EncodeRequest, EncodeResponse};
use super::params::EncodeParams;
use super::registry::{CodecLoader, CodecRegistry};

/// Messages to the encode worker.
#[derive(Debug)]
pub enum WorkerMsg {
    Encode(Box<EncodeRequest>),
    Terminate,
}

/// Sending side of a running worker.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    tx: mpsc::UnboundedSender<WorkerMsg>,
}

impl WorkerHandle {
    /// Queue a request. Returns `false` once the worker has stopped.
    pub fn post(&self, request: EncodeRequest) -> bool {
        self.tx.send(WorkerMsg::Encode(Box::new(request))).is_ok()
    }

    pub fn terminate(&self) {
        let _ = self.tx.send(WorkerMsg::Terminate);
    }
}

pub struct EncodeWorker {
    rx: mpsc::UnboundedReceiver<WorkerMsg>,
    out: mpsc::UnboundedSender<EncodeResponse>,
    registry: Arc<CodecRegistry>,
}

impl EncodeWorker {
    pub fn new(
        rx: mpsc::UnboundedReceiver<WorkerMsg>,
        out: mpsc::UnboundedSender<EncodeResponse>,
        registry: Arc<CodecRegistry>,
    ) -> Self {
        Self { rx, out, registry }
    }

    pub async fn run(mut self) {
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                biased;

                msg = self.rx.recv() => match msg {
                    Some(WorkerMsg::Encode(request)) => {
                        let registry = self.registry.clone();
                        let out = self.out.clone();
                        tasks.spawn(async move {
                            let _ = out.send(process(&registry, *request).await);
                        });
                    }
                    Some(WorkerMsg::Terminate) | None => break,
                },

                Some(done) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = done {
                        crate::log!("error"; "encode task panicked: {}", e);
                    }
                }
            }
        }

        if !tasks.is_empty() {
            crate::debug!("worker"; "terminated with {} requests in flight", tasks.len());
        }
        tasks.abort_all();
    }
}

/// Start a worker on the current runtime.
pub fn spawn_worker(
    loader: Arc<dyn CodecLoader>,
) -> (WorkerHandle, mpsc::UnboundedReceiver<EncodeResponse>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let worker = EncodeWorker::new(rx, out_tx, Arc::new(CodecRegistry::new(loader)));
    tokio::spawn(worker.run());
    (WorkerHandle { tx }, out_rx)
}

/// Handle one request end to end. Never fails: errors become a failed
/// response carrying the error text.
pub async fn process(registry: &CodecRegistry, request: EncodeRequest) -> EncodeResponse {
    let id = request.id.clone();
    match encode(registry, request).await {
        Ok(buffer) => {
            crate::debug!("worker"; "encoded {} ({} bytes)", id, buffer.len());
            EncodeResponse::ok(id, buffer)
        }
        Err(e) => {
            crate::log!("error"; "encode {} failed: {}", id, e);
            EncodeResponse::fail(id, e.to_string())
        }
    }
}

async fn encode(registry: &CodecRegistry, request: EncodeRequest) -> Result<Vec<u8>, EncodeError> {
    let EncodeRequest {
        image_data,
        format,
        options,
        ..
    } = request;
    let format = ImageFormat::from_mime(&format).ok_or(EncodeError::Unsupported(format))?;
    let params = EncodeParams::map(format, &options);
    let codec = registry.get(format).await?;

    let buffer = tokio::task::spawn_blocking(move || codec.encode(&image_data, &params))
        .await
        .map_err(|e| EncodeError::Task(e.to_string()))??;
    Ok(buffer)
}
