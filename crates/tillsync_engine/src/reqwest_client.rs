//! [`HttpClient`] backed by `reqwest`.

use crate::rest::{HttpClient, HttpRequest, HttpResponse, Method};
use async_trait::async_trait;
use tracing::debug;

/// An [`HttpClient`] that sends requests with a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        let mut builder = self
            .client
            .request(method(request.method), request.url.as_str())
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                format!("request to {} timed out", request.url)
            } else if e.is_connect() {
                format!("cannot reach {}: {e}", request.url)
            } else {
                e.to_string()
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| format!("failed to read response body: {e}"))?;
        debug!(url = %request.url, status, bytes = body.len(), "http response");

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}
