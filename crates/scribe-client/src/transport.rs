use std::time::Duration;

use async_trait::async_trait;
use http::{HeaderMap, HeaderValue, header};
use reqwest::{Client, Request, Response};

/// Sends a fully built HTTP request
///
/// Implementations must be safe to share across concurrent calls.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute `request` and return the raw response
    async fn execute(&self, request: Request) -> reqwest::Result<Response>;
}

#[async_trait]
impl Transport for Client {
    async fn execute(&self, request: Request) -> reqwest::Result<Response> {
        Self::execute(self, request).await
    }
}

/// Pooled HTTP client shared by every call of one `AudioClient`
///
/// No overall timeout is set here; deadlines are attached per call.
pub(crate) fn http_client(mut headers: HeaderMap) -> reqwest::Result<Client> {
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));

    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Some(Duration::from_secs(5)))
        .tcp_nodelay(true)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .default_headers(headers)
        .build()
}
