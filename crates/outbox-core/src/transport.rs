//! HTTP transport adapter (libcurl via the `curl` crate).
//!
//! Performs one request against the coordination server. A non-2xx status is
//! returned as [`RequestError::Status`] so it can be told apart from a
//! request that never got an answer. Also serves as the queue's
//! [`FlushHandler`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use crate::classify::RequestError;
use crate::config::ServerConfig;
use crate::method::Method;
use crate::replay::FlushHandler;

/// Response to a successful (2xx) request.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u32,
    pub body: Vec<u8>,
}

impl Response {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: Url,
    connect_timeout: Duration,
    request_timeout: Duration,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(cfg: &ServerConfig) -> Result<Self> {
        let base_url = Url::parse(&cfg.base_url)
            .with_context(|| format!("invalid server base_url: {}", cfg.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("server base_url cannot carry a path: {}", cfg.base_url);
        }
        Ok(Self {
            base_url,
            connect_timeout: cfg.connect_timeout(),
            request_timeout: cfg.request_timeout(),
            token: cfg.token.clone(),
        })
    }

    /// Full URL for `endpoint`, appended to the base URL's path.
    pub fn url_for(&self, endpoint: &str) -> Result<Url, RequestError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let endpoint = endpoint.trim_start_matches('/');
        Url::parse(&format!("{base}/{endpoint}"))
            .map_err(|e| RequestError::Other(format!("invalid endpoint {endpoint}: {e}")))
    }

    /// Perform one request. Blocking curl work runs on the blocking pool.
    pub async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&str>,
    ) -> Result<Response, RequestError> {
        let request = PreparedRequest {
            url: self.url_for(endpoint)?,
            method,
            body: body.map(str::to_owned),
            connect_timeout: self.connect_timeout,
            request_timeout: self.request_timeout,
            token: self.token.clone(),
        };
        tokio::task::spawn_blocking(move || request.perform())
            .await
            .map_err(|e| RequestError::Other(format!("transport task failed: {e}")))?
    }
}

#[async_trait]
impl FlushHandler for HttpTransport {
    async fn deliver(&self, method: Method, endpoint: &str, body: Option<&str>) -> bool {
        match self.send(method, endpoint, body).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(%method, endpoint, error = %e, "redelivery attempt failed");
                false
            }
        }
    }
}

struct PreparedRequest {
    url: Url,
    method: Method,
    body: Option<String>,
    connect_timeout: Duration,
    request_timeout: Duration,
    token: Option<String>,
}

impl PreparedRequest {
    /// Runs in the current thread; call from `spawn_blocking` if used from async code.
    fn perform(self) -> Result<Response, RequestError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(self.url.as_str())?;
        easy.custom_request(self.method.as_str())?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.request_timeout)?;

        let mut headers = curl::easy::List::new();
        headers.append("Accept: application/json")?;
        if self.body.is_some() {
            headers.append("Content-Type: application/json")?;
        }
        if let Some(token) = &self.token {
            headers.append(&format!("Authorization: Bearer {token}"))?;
        }
        easy.http_headers(headers)?;

        if let Some(body) = &self.body {
            easy.post_fields_copy(body.as_bytes())?;
        }

        let mut response_body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                response_body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        if !(200..300).contains(&status) {
            return Err(RequestError::Status(status));
        }
        Ok(Response {
            status,
            body: response_body,
        })
    }
}
