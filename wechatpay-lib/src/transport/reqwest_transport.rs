//! Default transport backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;

use super::{HttpRequest, HttpResponse, HttpTransport};
use crate::{Result, WechatPayError};

/// `reqwest`-backed [`HttpTransport`].
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl ReqwestTransport {
    /// Build a transport with the given request timeout.
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| WechatPayError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    fn map_reqwest_error(&self, request: &HttpRequest, e: reqwest::Error) -> WechatPayError {
        if e.is_timeout() {
            WechatPayError::ConnectionTimeout {
                operation: format!("{} {}", request.method, request.url),
                timeout_ms: self.timeout_secs * 1000,
            }
        } else if e.is_connect() {
            WechatPayError::ConnectionFailed {
                target: request.url.clone(),
                reason: e.to_string(),
            }
        } else {
            WechatPayError::Transport(format!("request failed: {}", e))
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| WechatPayError::Internal(format!("invalid HTTP method: {}", e)))?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(&request, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_reqwest_error(&request, e))?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
