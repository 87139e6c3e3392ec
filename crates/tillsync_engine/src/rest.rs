//! REST remote implementation.
//!
//! Maps the [`RemoteService`] calls onto a PostgREST-style API:
//!
//! | call         | request                                                   |
//! |--------------|-----------------------------------------------------------|
//! | `upsert`     | `POST /rest/v1/{table}` + `Prefer: resolution=merge-duplicates` |
//! | `update`     | `PATCH /rest/v1/{table}?id=eq.{id}`                       |
//! | `delete`     | `DELETE /rest/v1/{table}?id=eq.{id}`                      |
//! | `select_all` | `GET /rest/v1/{table}?select=*`                           |
//!
//! The actual HTTP client is abstracted via [`HttpClient`] so the mapping can
//! be tested without a network.

use crate::remote::{RemoteError, RemoteResult, RemoteService};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tillsync_model::{Record, Table};
use url::Url;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

/// A request handed to an [`HttpClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Method.
    pub method: Method,
    /// Absolute URL, query included.
    pub url: Url,
    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,
    /// JSON body.
    pub body: Option<Vec<u8>>,
    /// Request timeout.
    pub timeout: Duration,
}

/// A response returned by an [`HttpClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Raw body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport. An `Err`
/// means no response was received at all.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String>;
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        (**self).send(request).await
    }
}

/// Connection settings for [`RestRemote`].
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Project URL, e.g. `https://abc.supabase.co`.
    pub base_url: String,
    /// API key sent as `apikey` and bearer token.
    pub api_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl RestConfig {
    /// Creates a configuration with a 30 second timeout.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A remote service reached over a PostgREST-style HTTP API.
pub struct RestRemote<C: HttpClient> {
    config: RestConfig,
    base: Url,
    client: C,
}

impl<C: HttpClient> RestRemote<C> {
    /// Creates a REST remote.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Transport`] if the base URL does not parse.
    pub fn new(config: RestConfig, client: C) -> RemoteResult<Self> {
        let trimmed = config.base_url.trim_end_matches('/');
        let base = Url::parse(&format!("{trimmed}/rest/v1/"))
            .map_err(|e| RemoteError::Transport(format!("invalid base url: {e}")))?;
        Ok(Self {
            config,
            base,
            client,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    fn table_url(&self, table: Table) -> RemoteResult<Url> {
        self.base
            .join(table.as_str())
            .map_err(|e| RemoteError::Transport(format!("invalid table url: {e}")))
    }

    fn row_url(&self, table: Table, id: &str) -> RemoteResult<Url> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, body: Option<Vec<u8>>) -> HttpRequest {
        let mut headers = vec![
            ("apikey".to_string(), self.config.api_key.clone()),
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.config.api_key),
            ),
        ];
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        HttpRequest {
            method,
            url,
            headers,
            body,
            timeout: self.config.timeout,
        }
    }

    async fn execute(&self, request: HttpRequest) -> RemoteResult<HttpResponse> {
        let response = self
            .client
            .send(request)
            .await
            .map_err(RemoteError::Transport)?;

        if !response.is_success() {
            return Err(RemoteError::Status {
                status: response.status,
                message: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }
        Ok(response)
    }

    fn encode(value: &impl serde::Serialize) -> RemoteResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| RemoteError::Encode(e.to_string()))
    }
}

#[async_trait]
impl<C: HttpClient> RemoteService for RestRemote<C> {
    async fn upsert(&self, table: Table, rows: Vec<Record>) -> RemoteResult<()> {
        let body = Self::encode(&rows)?;
        let mut request = self.request(Method::Post, self.table_url(table)?, Some(body));
        request.headers.push((
            "Prefer".to_string(),
            "resolution=merge-duplicates,return=minimal".to_string(),
        ));
        self.execute(request).await?;
        Ok(())
    }

    async fn update(&self, table: Table, id: &str, patch: Record) -> RemoteResult<()> {
        let body = Self::encode(&patch)?;
        let request = self.request(Method::Patch, self.row_url(table, id)?, Some(body));
        self.execute(request).await?;
        Ok(())
    }

    async fn delete(&self, table: Table, id: &str) -> RemoteResult<()> {
        let request = self.request(Method::Delete, self.row_url(table, id)?, None);
        self.execute(request).await?;
        Ok(())
    }

    async fn select_all(&self, table: Table) -> RemoteResult<Vec<Record>> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("select", "*");
        let response = self.execute(self.request(Method::Get, url, None)).await?;

        let rows: Vec<Value> = serde_json::from_slice(&response.body)
            .map_err(|e| RemoteError::Decode(format!("{table}: {e}")))?;
        rows.into_iter()
            .map(|row| match row {
                Value::Object(record) => Ok(record),
                other => Err(RemoteError::Decode(format!(
                    "{table}: expected object row, got {other}"
                ))),
            })
            .collect()
    }
}
