// Item-info strategy: the oldest schema, `{"item_list": [{"video": {...}}]}`

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use super::traits::{address_urls, cover_url, get_json, ExtractionStrategy};
use crate::resolver::errors::ResolveError;
use crate::resolver::http::HttpClient;
use crate::resolver::models::ExtractionResult;

pub const ITEM_INFO_API: &str = "https://www.iesdouyin.com/web/api/v2/aweme/iteminfo/";

pub struct ItemInfoExtractor {
    http: Arc<dyn HttpClient>,
}

impl ItemInfoExtractor {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }

    pub fn api_url(media_id: &str) -> String {
        format!("{}?item_ids={}", ITEM_INFO_API, media_id)
    }

    fn parse(&self, json: &Value) -> Result<ExtractionResult, ResolveError> {
        let item_list = json
            .get("item_list")
            .ok_or_else(|| ResolveError::extraction(self.name(), "No `item_list` in response"))?;

        let items = match item_list.as_array() {
            Some(items) if !items.is_empty() => items,
            _ => {
                return Err(ResolveError::extraction(
                    self.name(),
                    "No element in response.item_list",
                ))
            }
        };

        for (index, item) in items.iter().enumerate() {
            let Some(video) = item.get("video").filter(|v| v.is_object()) else {
                warn!("[{}] item {}: no `video`", self.name(), index);
                continue;
            };

            match address_urls(video) {
                Ok(urls) => return Ok(ExtractionResult::new(cover_url(item), urls)),
                Err(cause) => warn!("[{}] item {}: {}", self.name(), index, cause),
            }
        }

        Err(ResolveError::extraction(
            self.name(),
            format!("None of the {} items carries a usable video address", items.len()),
        ))
    }
}

#[async_trait]
impl ExtractionStrategy for ItemInfoExtractor {
    fn name(&self) -> &'static str {
        "item-info"
    }

    async fn extract(&self, media_id: &str) -> Result<ExtractionResult, ResolveError> {
        let json = get_json(self.http.as_ref(), self.name(), &Self::api_url(media_id)).await?;
        self.parse(&json)
    }
}
