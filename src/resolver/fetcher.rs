// Byte downloads for media and reconstruction assets

use std::sync::Arc;
use tracing::debug;

use super::errors::ResolveError;
use super::http::HttpClient;
use super::utils::friendly_size;

/// Downloaded body together with its declared content type
#[derive(Debug, Clone, Default)]
pub struct FetchedMedia {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Single-shot downloader. No retries; an empty body is returned as-is and
/// callers check the length.
pub struct MediaFetcher {
    http: Arc<dyn HttpClient>,
}

impl MediaFetcher {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }

    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, ResolveError> {
        Ok(self.fetch_media(url).await?.bytes)
    }

    pub async fn fetch_media(&self, url: &str) -> Result<FetchedMedia, ResolveError> {
        let response = self
            .http
            .get(url)
            .await
            .map_err(|e| ResolveError::fetch(url, e.to_string()))?;

        if !response.is_success() {
            return Err(ResolveError::fetch(url, format!("HTTP {}", response.status)));
        }

        if !response.body.is_empty() {
            debug!(
                "[MediaFetcher] Downloaded `{}`, size: {}",
                url,
                friendly_size(response.body.len())
            );
        }

        Ok(FetchedMedia {
            bytes: response.body,
            content_type: response.content_type,
        })
    }
}
