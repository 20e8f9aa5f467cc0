//! Reqwest HTTP Adapter
//!
//! Production implementation of `HttpPort`. One client per endpoint family,
//! each with its own request timeout. No retries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::ports::http::{HttpMethod, HttpPort, HttpRequest, HttpResponse, TransportError};

/// Default per-request timeout, matching the remote API's expectations
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// `HttpPort` backed by a `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestHttp {
    http: Client,
    timeout: Duration,
}

impl ReqwestHttp {
    /// Create an adapter with the default 30 second timeout
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create an adapter with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

#[async_trait]
impl HttpPort for ReqwestHttp {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut req = match request.method {
            HttpMethod::Get => self.http.get(&request.url),
            HttpMethod::Post => self.http.post(&request.url),
        };

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        if let Some(ref body) = request.body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(|e| self.map_error(e))?;

        let url = response.url().to_string();
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    v.to_str().unwrap_or("<binary>").to_string(),
                )
            })
            .collect();
        let body = response.text().await.map_err(|e| self.map_error(e))?;

        Ok(HttpResponse { url, status, headers, body })
    }
}
