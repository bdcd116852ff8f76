// Outbound HTTP seam
//
// Every upstream call (share link redirect, schema endpoints, media downloads)
// goes through `HttpClient`, so tests can script responses without a network.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::models::NetworkConfig;

/// Mobile Safari user agent; the share endpoints serve the lightweight page to it
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 10_3_1 like Mac OS X) AppleWebKit/603.1.30 (KHTML, like Gecko) Version/10.0 Mobile/14E304 Safari/602.1 Edg/97.0.4692.99";

/// Transport-level failure
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("unable to build http client: {0}")]
    Client(String),
}

/// A fully-read response
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// Effective URL after redirects
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET `url`, following redirects, and read the whole body
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError>;
}

/// `reqwest`-backed client
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(config: &NetworkConfig) -> Result<Self, HttpError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(MOBILE_USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(seconds) = config.timeout {
            builder = builder.timeout(Duration::from_secs(seconds as u64));
        }

        if let Some(proxy_url) = config.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| HttpError::Client(format!("invalid proxy {}: {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                HttpError::Timeout {
                    url: url.to_string(),
                }
            } else {
                HttpError::Request {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        };

        let response = self.client.get(url).send().await.map_err(map_err)?;

        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let body = response.bytes().await.map_err(map_err)?.to_vec();

        debug!("[Http] GET {} -> {} ({}, {} bytes)", url, status, final_url, body.len());

        Ok(HttpResponse {
            final_url,
            status,
            content_type,
            body,
        })
    }
}
