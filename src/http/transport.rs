//! Dispatch stage: turns an [`ApiRequest`] into bytes on the wire.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use super::request::{ApiRequest, ApiResponse};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Sends a fully decorated request and returns the raw response.
///
/// Implementations return `Ok` for every response that arrived, whatever its
/// status; `Err` means no response context is available.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

/// Transport over a shared reqwest client with a cookie jar.
///
/// The jar carries the backend's HttpOnly session cookie, which is what the
/// refresh endpoint exchanges for a new access token.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl ReqwestTransport {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .cookie_store(true)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| ClientError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.config.endpoint(request.path());
        let mut builder = self
            .client
            .request(request.method().clone(), &url)
            .headers(json_headers(request.bearer()));
        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ApiResponse::new(status, body))
    }
}

impl ReqwestTransport {
    fn map_send_error(&self, error: reqwest::Error) -> ClientError {
        if error.is_timeout() {
            ClientError::Timeout(self.config.timeout().as_millis() as u64)
        } else {
            ClientError::Network(error)
        }
    }
}

/// JSON headers, plus a bearer credential when one is given.
pub fn json_headers(bearer: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(token) = bearer {
        if let Ok(val) = HeaderValue::from_str(&format!("Bearer {token}")) {
            headers.insert(AUTHORIZATION, val);
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_headers_attach_bearer_only_when_given() {
        let headers = json_headers(Some("abc"));
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");

        let headers = json_headers(None);
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn unrepresentable_token_is_dropped() {
        let headers = json_headers(Some("bad\ntoken"));
        assert!(headers.get(AUTHORIZATION).is_none());
    }
}
