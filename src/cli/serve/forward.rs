//! Incoming HTTP requests to offline-cache requests.

use anyhow::{Context, Result};
use url::Url;

use crate::offline::Request;

/// Headers that describe one hop, not the resource. Never relayed.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "content-length",
    "host",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// Map a request path such as `/css/style.css?v=2` under `origin`.
pub fn target_url(origin: &Url, path: &str) -> Result<Url> {
    // Leading slashes are stripped so the path stays under the origin.
    origin
        .join(path.trim_start_matches('/'))
        .with_context(|| format!("invalid request path `{path}`"))
}

/// Build the request forwarded for `incoming`, consuming its body.
pub fn forward(incoming: &mut tiny_http::Request, origin: &Url) -> Result<Request> {
    let url = target_url(origin, incoming.url())?;
    let mut request = Request::new(incoming.method().as_str(), url);

    for header in incoming.headers() {
        let name = header.field.as_str().as_str();
        if !is_hop_by_hop(name) {
            request = request.with_header(name, header.value.as_str());
        }
    }

    let mut body = Vec::new();
    incoming
        .as_reader()
        .read_to_end(&mut body)
        .context("failed to read request body")?;
    Ok(request.with_body(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_url() {
        let origin = Url::parse("https://a.example/app/").unwrap();
        assert_eq!(
            target_url(&origin, "/css/style.css?v=2").unwrap().as_str(),
            "https://a.example/app/css/style.css?v=2"
        );
        assert_eq!(target_url(&origin, "/").unwrap().as_str(), "https://a.example/app/");
        // Scheme-relative paths stay on the origin
        assert_eq!(
            target_url(&origin, "//evil.example/x").unwrap().host_str(),
            Some("a.example")
        );
    }

    #[test]
    fn test_hop_by_hop() {
        assert!(is_hop_by_hop("Host"));
        assert!(is_hop_by_hop("Transfer-Encoding"));
        assert!(!is_hop_by_hop("Content-Type"));
        assert!(!is_hop_by_hop("Accept"));
    }
}
