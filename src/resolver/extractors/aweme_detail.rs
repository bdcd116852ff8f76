// Aweme-detail strategy: `{"aweme_detail": {"video": {...}}}`
//
// The endpoint only answers requests that look like they come from the app,
// hence the client query parameters.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::traits::{address_urls, cover_url, get_json, ExtractionStrategy};
use crate::resolver::errors::ResolveError;
use crate::resolver::http::HttpClient;
use crate::resolver::models::ExtractionResult;

pub const AWEME_DETAIL_API: &str = "https://www.iesdouyin.com/aweme/v1/web/aweme/detail/";

const CLIENT_PARAMS: &[(&str, &str)] = &[
    ("aid", "1128"),
    ("version_name", "23.5.0"),
    ("device_platform", "android"),
    ("os_version", "2333"),
];

pub struct AwemeDetailExtractor {
    http: Arc<dyn HttpClient>,
}

impl AwemeDetailExtractor {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }

    pub fn api_url(media_id: &str) -> String {
        let mut url = format!("{}?aweme_id={}", AWEME_DETAIL_API, media_id);
        for (key, value) in CLIENT_PARAMS {
            url.push_str(&format!("&{}={}", key, value));
        }
        url
    }

    fn parse(&self, json: &Value) -> Result<ExtractionResult, ResolveError> {
        let detail = json
            .get("aweme_detail")
            .ok_or_else(|| ResolveError::extraction(self.name(), "No `aweme_detail` in response"))?;

        let is_empty = match detail {
            Value::Object(map) => map.is_empty(),
            _ => true,
        };
        if is_empty {
            return Err(ResolveError::extraction(self.name(), "Empty response.aweme_detail"));
        }

        // A detail without a usable video is a miss, so the chain moves on
        let video = detail
            .get("video")
            .filter(|v| v.is_object())
            .ok_or_else(|| ResolveError::extraction(self.name(), "No `video` in aweme_detail"))?;

        let urls = address_urls(video).map_err(|cause| ResolveError::extraction(self.name(), cause))?;
        Ok(ExtractionResult::new(cover_url(detail), urls))
    }
}

#[async_trait]
impl ExtractionStrategy for AwemeDetailExtractor {
    fn name(&self) -> &'static str {
        "aweme-detail"
    }

    async fn extract(&self, media_id: &str) -> Result<ExtractionResult, ResolveError> {
        let json = get_json(self.http.as_ref(), self.name(), &Self::api_url(media_id)).await?;
        self.parse(&json)
    }
}
