//! HTTP response handlers.

use anyhow::Result;
use tiny_http::{Header, Request, Response, StatusCode};

use super::forward::is_hop_by_hop;
use crate::offline;
use crate::utils::mime::types::PLAIN;

/// Relay a response produced by the cache manager.
pub fn respond_relayed(request: Request, relayed: offline::Response) -> Result<()> {
    let headers: Vec<Header> = relayed
        .headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name))
        .filter_map(|(name, value)| Header::from_bytes(name.as_bytes(), value.as_bytes()).ok())
        .collect();

    let len = relayed.body.len();
    let response = Response::new(
        StatusCode(relayed.status),
        headers,
        relayed.body.as_ref(),
        Some(len),
        None,
    );
    request.respond(response)?;
    Ok(())
}

/// Respond with 502 Bad Gateway (the fetch failed).
pub fn respond_bad_gateway(request: Request, error: &dyn std::fmt::Display) -> Result<()> {
    send_plain(request, 502, format!("502 Bad Gateway\n\n{error}\n"))
}

/// Respond with 400 Bad Request (unusable request line or body).
pub fn respond_bad_request(request: Request, error: &anyhow::Error) -> Result<()> {
    send_plain(request, 400, format!("400 Bad Request\n\n{error:#}\n"))
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_plain(request, 503, "503 Service Unavailable".to_string())
}

fn send_plain(request: Request, status: u16, body: String) -> Result<()> {
    let mut response = Response::from_string(body).with_status_code(StatusCode(status));
    if let Ok(header) = Header::from_bytes("Content-Type", PLAIN) {
        response.add_header(header);
    }
    request.respond(response)?;
    Ok(())
}
