//! `worker`: the encode worker over stdio.
//!
//! One JSON request per stdin line, one JSON response per stdout line in
//! completion order. Logs go to stderr so stdout carries only responses.
//! At end of input the worker drains in-flight requests, then exits.

use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::{
    debug,
    encode::{BuiltinLoader, EncodeRequest, EncodeResponse, spawn_worker},
    log,
};

/// What the stdin reader hands to the event loop.
#[derive(Debug)]
enum Inbound {
    Request(Box<EncodeRequest>),
    /// Answered immediately, never reaches the worker.
    Rejected(EncodeResponse),
}

pub fn run() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(run_stdio())
}

async fn run_stdio() -> Result<()> {
    let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
    // Blocking stdin reads stay on their own thread.
    std::thread::spawn(move || read_stdin(&inbound_tx));

    let (worker, mut responses) = spawn_worker(Arc::new(BuiltinLoader));
    let mut stdout = std::io::stdout();
    let mut pending = 0usize;
    let mut eof = false;

    while !(eof && pending == 0) {
        tokio::select! {
            inbound = inbound_rx.recv(), if !eof => match inbound {
                Some(Inbound::Request(request)) => {
                    if worker.post(*request) {
                        pending += 1;
                    }
                }
                Some(Inbound::Rejected(response)) => write_line(&mut stdout, &response)?,
                None => eof = true,
            },

            Some(response) = responses.recv() => {
                pending = pending.saturating_sub(1);
                write_line(&mut stdout, &response)?;
            }

            else => break,
        }
    }

    debug!("worker"; "input closed, stopping");
    worker.terminate();
    Ok(())
}

fn read_stdin(tx: &mpsc::UnboundedSender<Inbound>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log!("error"; "stdin: {}", e);
                break;
            }
        };
        if let Some(inbound) = parse_line(&line)
            && tx.send(inbound).is_err()
        {
            break;
        }
    }
}

/// Parse one input line. Malformed lines with a readable `id` are answered
/// with a failure; anything else is logged and skipped.
fn parse_line(line: &str) -> Option<Inbound> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<EncodeRequest>(line) {
        Ok(request) => Some(Inbound::Request(Box::new(request))),
        Err(e) => {
            let id = serde_json::from_str::<serde_json::Value>(line)
                .ok()
                .and_then(|v| v.get("id")?.as_str().map(str::to_string));
            match id {
                Some(id) => {
                    log!("error"; "request {} is malformed: {}", id, e);
                    Some(Inbound::Rejected(EncodeResponse::fail(
                        id,
                        format!("Invalid request: {e}"),
                    )))
                }
                None => {
                    log!("error"; "skipping unreadable request: {}", e);
                    None
                }
            }
        }
    }
}

fn write_line(out: &mut impl Write, response: &EncodeResponse) -> Result<()> {
    serde_json::to_writer(&mut *out, response).context("failed to serialize response")?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}
