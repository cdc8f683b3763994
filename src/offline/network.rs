//! Network side of the offline cache.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::error::NetError;
use super::request::Request;
use super::response::{Response, ResponseKind};

/// Issues requests to the network.
///
/// `Err` means no response was produced at all (offline, DNS, timeout).
/// HTTP error statuses are successful fetches carrying that status.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, NetError>;
}

/// HTTP client backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct HttpNetwork {
    inner: Client,
    scope: Url,
    timeout: Duration,
}

impl HttpNetwork {
    /// `scope` decides whether a response is same-origin or cross-origin.
    pub fn new(scope: Url, timeout: Duration) -> Result<Self, NetError> {
        let inner = Client::builder()
            .build()
            .map_err(NetError::from_reqwest)?;
        Ok(Self {
            inner,
            scope,
            timeout,
        })
    }

    fn build(&self, request: &Request) -> Result<reqwest::RequestBuilder, NetError> {
        let method = reqwest::Method::from_bytes(request.method().as_bytes())
            .map_err(|e| NetError::Http(e.to_string()))?;
        let mut req = self
            .inner
            .request(method, request.url().clone())
            .timeout(self.timeout);
        for (k, v) in request.headers() {
            req = req.header(k, v);
        }
        if !request.body().is_empty() {
            req = req.body(request.body().clone());
        }
        Ok(req)
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetError> {
        let resp = self
            .build(request)?
            .send()
            .await
            .map_err(NetError::from_reqwest)?;

        let status = resp.status();
        let headers: Vec<(String, String)> = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let allow_origin = resp
            .headers()
            .get(reqwest::header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let kind = ResponseKind::classify(&self.scope, resp.url(), allow_origin.as_deref());

        let body = resp.bytes().await.map_err(NetError::from_reqwest)?;
        crate::debug!("net"; "{} {} -> {}", request.method(), request.url(), status.as_u16());

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> HttpNetwork {
        let scope = Url::parse("https://a.example/").unwrap();
        HttpNetwork::new(scope, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_build_carries_headers_and_body() {
        let url = Url::parse("https://a.example/api").unwrap();
        let request = Request::new("post", url.clone())
            .with_header("x-trace", "1")
            .with_body("payload");

        let built = network().build(&request).unwrap().build().unwrap();
        assert_eq!(built.method(), reqwest::Method::POST);
        assert_eq!(built.url(), &url);
        assert_eq!(built.headers()["x-trace"], "1");
        assert_eq!(built.timeout(), Some(&Duration::from_secs(5)));
        assert_eq!(built.body().and_then(|b| b.as_bytes()), Some(&b"payload"[..]));
    }

    #[test]
    fn test_get_has_no_body() {
        let request = Request::get(Url::parse("https://a.example/").unwrap());
        let built = network().build(&request).unwrap().build().unwrap();
        assert!(built.body().is_none());
    }

    #[tokio::test]
    async fn test_refused_connection_is_no_response() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();
        assert!(network().fetch(&Request::get(url)).await.is_err());
    }
}
