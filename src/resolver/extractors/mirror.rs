// Mirror strategy: a third-party parse service keyed by the share link
//
// Answers with a flat object, `{"cover": "...", "video": "..."}` or, for
// posts without a combined video, `{"cover": "...", "audio": "....mp3"}`.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::traits::{get_json, ExtractionStrategy};
use crate::resolver::errors::ResolveError;
use crate::resolver::http::HttpClient;
use crate::resolver::link::LinkMap;
use crate::resolver::models::ExtractionResult;

pub struct MirrorExtractor {
    http: Arc<dyn HttpClient>,
    links: Arc<LinkMap>,
    endpoint: Option<String>,
}

impl MirrorExtractor {
    pub fn new(http: Arc<dyn HttpClient>, links: Arc<LinkMap>, endpoint: Option<String>) -> Self {
        Self {
            http,
            links,
            endpoint,
        }
    }

    /// `<endpoint><percent-encoded share url>`
    pub fn api_url(endpoint: &str, share_url: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(share_url.as_bytes()).collect();
        format!("{}{}", endpoint, encoded)
    }

    fn parse(&self, json: &Value) -> Result<ExtractionResult, ResolveError> {
        let cover = json
            .get("cover")
            .and_then(Value::as_str)
            .ok_or_else(|| ResolveError::extraction(self.name(), "No `cover` in response"))?;

        let media = ["video", "audio"]
            .iter()
            .find_map(|key| json.get(*key).and_then(Value::as_str).filter(|s| !s.is_empty()))
            .ok_or_else(|| {
                ResolveError::extraction(self.name(), "No `video` or `audio` in response")
            })?;

        Ok(ExtractionResult::new(cover, vec![media.to_string()]))
    }
}

#[async_trait]
impl ExtractionStrategy for MirrorExtractor {
    fn name(&self) -> &'static str {
        "mirror"
    }

    async fn extract(&self, media_id: &str) -> Result<ExtractionResult, ResolveError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| ResolveError::extraction(self.name(), "No mirror endpoint configured"))?;

        let share_url = self.links.share_url_for(media_id).ok_or_else(|| {
            ResolveError::extraction(self.name(), format!("No share url known for {}", media_id))
        })?;

        let json = get_json(self.http.as_ref(), self.name(), &Self::api_url(endpoint, &share_url)).await?;
        self.parse(&json)
    }
}
