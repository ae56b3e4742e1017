//! Request transport
//!
//! The leaf of the client: sends one request to a path under a fixed base
//! URL and resolves with the parsed JSON body or a [`TransportError`].
//! No retries happen at this layer.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, TransportError};

/// HTTP method of a transport request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Sends requests to the analysis server
///
/// Trait-based so pollers and command issuers can run against scripted
/// transports in tests. Empty response bodies resolve to `Value::Null`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request to `path`, which is relative to the base URL
    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value>;

    async fn get(&self, path: &str) -> Result<Value> {
        self.request(Method::Get, path, None).await
    }

    async fn put(&self, path: &str, body: Option<&Value>) -> Result<Value> {
        self.request(Method::Put, path, body).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(Method::Post, path, Some(body)).await
    }

    async fn delete(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(Method::Delete, path, Some(body)).await
    }
}

/// HTTP implementation of [`Transport`] over reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Base URL of the server (e.g., "http://localhost:5000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl HttpTransport {
    /// Default endpoint root of the analysis server
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:5000";

    /// Create a new transport
    ///
    /// # Arguments
    /// * `base_url` - The endpoint root (e.g., "http://localhost:5000")
    ///
    /// # Example
    /// ```
    /// use harmony_client::HttpTransport;
    ///
    /// let transport = HttpTransport::new("http://localhost:5000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new transport with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Create a new transport whose requests fail after `timeout`
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check the status code and parse the body as JSON
    async fn handle_response(&self, response: reqwest::Response) -> Result<Value> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TransportError::api_error(status.as_u16(), error_text));
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text)
            .map_err(|e| TransportError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let builder = match method {
            Method::Get => self.client.get(&url),
            Method::Put => self.client.put(&url),
            Method::Post => self.client.post(&url),
            Method::Delete => self.client.delete(&url),
        };
        let builder = match body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = builder.send().await?;
        self.handle_response(response).await
    }
}
