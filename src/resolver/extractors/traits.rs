// ExtractionStrategy trait and the schema helpers the strategies share

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::resolver::errors::ResolveError;
use crate::resolver::http::HttpClient;
use crate::resolver::models::ExtractionResult;

/// One upstream schema, turned into an `ExtractionResult`
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Name of the strategy (for logging and errors)
    fn name(&self) -> &'static str;

    async fn extract(&self, media_id: &str) -> Result<ExtractionResult, ResolveError>;
}

/// GET `url` and parse the body as JSON; every failure belongs to `strategy`
pub(crate) async fn get_json(
    http: &dyn HttpClient,
    strategy: &'static str,
    url: &str,
) -> Result<Value, ResolveError> {
    debug!("[{}] api_url: {}", strategy, url);

    let response = http
        .get(url)
        .await
        .map_err(|e| ResolveError::extraction(strategy, e.to_string()))?;

    let text = response.text();
    debug!("[{}] response ({}): {}", strategy, response.status, truncate(&text, 512));

    if text.trim().is_empty() {
        return Err(ResolveError::extraction(
            strategy,
            format!("Empty response (HTTP {})", response.status),
        ));
    }

    serde_json::from_str(&text)
        .map_err(|e| ResolveError::extraction(strategy, format!("Invalid JSON: {}", e)))
}

/// URL list of a `video` object: `download_addr` first, then `play_addr`
pub(crate) fn address_urls(video: &Value) -> Result<Vec<String>, String> {
    let addresses: Vec<(&str, &Value)> = ["download_addr", "play_addr"]
        .iter()
        .filter_map(|key| video.get(*key).map(|addr| (*key, addr)))
        .collect();

    if addresses.is_empty() {
        return Err("No `download_addr` or `play_addr` in video".to_string());
    }

    for (key, addr) in &addresses {
        let urls = string_list(&addr["url_list"]);
        if !urls.is_empty() {
            return Ok(urls);
        }
        debug!("No usable `url_list` in `{}`", key);
    }

    Err(format!(
        "No `url_list` in {}",
        addresses
            .iter()
            .map(|(key, _)| format!("`{}`", key))
            .collect::<Vec<_>>()
            .join(" or ")
    ))
}

/// First `origin_cover.url_list` entry, looked up on the video object and
/// then on the item itself; empty when neither has one
pub(crate) fn cover_url(item: &Value) -> String {
    [&item["video"]["origin_cover"], &item["origin_cover"]]
        .iter()
        .find_map(|cover| string_list(&cover["url_list"]).into_iter().next())
        .unwrap_or_default()
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
