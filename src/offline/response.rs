//! Captured responses and their origin classification.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

/// Origin classification of a network response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// Same origin as the controlled scope.
    Basic,
    /// Cross-origin, readable under CORS.
    Cors,
    /// Cross-origin, body not readable by the page.
    Opaque,
    /// Network-level error response.
    Error,
}

impl ResponseKind {
    /// Classify a response to `request_url` for a page on `scope`.
    ///
    /// `allow_origin` is the response's `Access-Control-Allow-Origin` value.
    pub fn classify(scope: &Url, request_url: &Url, allow_origin: Option<&str>) -> Self {
        if scope.origin() == request_url.origin() {
            return Self::Basic;
        }
        let scope_origin = scope.origin().ascii_serialization();
        match allow_origin.map(str::trim) {
            Some("*") => Self::Cors,
            Some(origin) if origin == scope_origin => Self::Cors,
            _ => Self::Opaque,
        }
    }

    /// Only same-origin and CORS responses are usable from the cache.
    pub fn is_cacheable(self) -> bool {
        matches!(self, Self::Basic | Self::Cors)
    }
}

/// A captured response. Cloning is cheap: the body is reference-counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub kind: ResponseKind,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: Vec::new(),
            body: body.into(),
            kind: ResponseKind::Basic,
        }
    }

    pub fn with_kind(mut self, kind: ResponseKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Any 2xx status.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Eligible for runtime caching: exactly 200 and a usable origin type.
    pub fn is_runtime_cacheable(&self) -> bool {
        self.status == 200 && self.kind.is_cacheable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_classify() {
        let scope = url("https://tools.example/");
        let same = url("https://tools.example/js/app.js");
        let cdn = url("https://cdn.example/lib.js");

        assert_eq!(ResponseKind::classify(&scope, &same, None), ResponseKind::Basic);
        assert_eq!(ResponseKind::classify(&scope, &cdn, Some("*")), ResponseKind::Cors);
        assert_eq!(
            ResponseKind::classify(&scope, &cdn, Some("https://tools.example")),
            ResponseKind::Cors
        );
        assert_eq!(
            ResponseKind::classify(&scope, &cdn, Some("https://other.example")),
            ResponseKind::Opaque
        );
        assert_eq!(ResponseKind::classify(&scope, &cdn, None), ResponseKind::Opaque);
    }

    #[test]
    fn test_runtime_cacheable() {
        assert!(Response::new(200, "x").is_runtime_cacheable());
        assert!(!Response::new(204, "").is_runtime_cacheable());
        assert!(!Response::new(404, "missing").is_runtime_cacheable());
        assert!(
            !Response::new(200, "x")
                .with_kind(ResponseKind::Opaque)
                .is_runtime_cacheable()
        );
        assert!(
            Response::new(200, "x")
                .with_kind(ResponseKind::Cors)
                .is_runtime_cacheable()
        );
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let resp = Response::new(200, "").with_header("Content-Type", "text/css");
        assert_eq!(resp.header("content-type"), Some("text/css"));
        assert_eq!(resp.header("etag"), None);
    }
}
