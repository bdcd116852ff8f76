// Extraction chain - ordered fallback across upstream schemas
//
// Strategy:
// 1. item-info (oldest schema)
// 2. aweme-detail (app schema)
// 3. mirror (third-party service keyed by share url)
// The first strategy that returns a result wins; the last error is kept.

use std::sync::Arc;
use tracing::{info, warn};

use super::aweme_detail::AwemeDetailExtractor;
use super::item_info::ItemInfoExtractor;
use super::mirror::MirrorExtractor;
use super::traits::ExtractionStrategy;
use crate::resolver::errors::ResolveError;
use crate::resolver::http::HttpClient;
use crate::resolver::link::LinkMap;
use crate::resolver::models::ExtractionResult;

pub struct ExtractionChain {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl ExtractionChain {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// item-info -> aweme-detail -> mirror
    pub fn standard(
        http: Arc<dyn HttpClient>,
        links: Arc<LinkMap>,
        mirror_endpoint: Option<String>,
    ) -> Self {
        let mut chain = Self::new();
        chain.add_strategy(Box::new(ItemInfoExtractor::new(http.clone())));
        chain.add_strategy(Box::new(AwemeDetailExtractor::new(http.clone())));
        chain.add_strategy(Box::new(MirrorExtractor::new(http, links, mirror_endpoint)));
        chain
    }

    pub fn add_strategy(&mut self, strategy: Box<dyn ExtractionStrategy>) {
        self.strategies.push(strategy);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub async fn extract(&self, media_id: &str) -> Result<ExtractionResult, ResolveError> {
        self.extract_from(media_id, 0).await.map(|(_, result)| result)
    }

    /// Run the chain starting at position `start`. Returns the position of
    /// the strategy that succeeded so callers can resume after it.
    pub async fn extract_from(
        &self,
        media_id: &str,
        start: usize,
    ) -> Result<(usize, ExtractionResult), ResolveError> {
        let mut last_error = None;

        for (index, strategy) in self.strategies.iter().enumerate().skip(start) {
            info!("[ExtractionChain] Trying strategy: {}", strategy.name());

            match strategy.extract(media_id).await {
                Ok(result) => {
                    info!(
                        "[ExtractionChain] ✓ Success with {} ({} urls)",
                        strategy.name(),
                        result.media_urls.len()
                    );
                    return Ok((index, result));
                }
                Err(e) => {
                    warn!("[ExtractionChain] ✗ {} failed: {}", strategy.name(), e);
                    last_error = Some(e);
                }
            }
        }

        let last = last_error
            .unwrap_or_else(|| ResolveError::extraction("chain", "No strategies left to try"));
        Err(ResolveError::ChainExhausted {
            last: Box::new(last),
        })
    }
}

impl Default for ExtractionChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::extractors::{AwemeDetailExtractor, ItemInfoExtractor, MirrorExtractor};
    use crate::resolver::test_support::StubHttp;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        name: &'static str,
        result: Option<ExtractionResult>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ExtractionStrategy for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn extract(&self, _media_id: &str) -> Result<ExtractionResult, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .clone()
                .ok_or_else(|| ResolveError::extraction(self.name, format!("{} schema mismatch", self.name)))
        }
    }

    fn scripted(name: &'static str, url: Option<&str>) -> (Box<dyn ExtractionStrategy>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = Scripted {
            name,
            result: url.map(|u| ExtractionResult::new("", vec![u.to_string()])),
            calls: calls.clone(),
        };
        (Box::new(strategy), calls)
    }

    #[tokio::test]
    async fn test_stops_at_first_success() {
        let mut chain = ExtractionChain::new();
        let (a, a_calls) = scripted("a", None);
        let (b, b_calls) = scripted("b", Some("https://b/1"));
        let (c, c_calls) = scripted("c", Some("https://c/1"));
        chain.add_strategy(a);
        chain.add_strategy(b);
        chain.add_strategy(c);

        let result = chain.extract("7049").await.unwrap();
        assert_eq!(result.media_urls, vec!["https://b/1"]);
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
        assert_eq!(c_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resume_after_success() {
        let mut chain = ExtractionChain::new();
        let (a, _) = scripted("a", Some("https://a/1"));
        let (b, _) = scripted("b", Some("https://b/1"));
        chain.add_strategy(a);
        chain.add_strategy(b);

        let (index, _) = chain.extract_from("7049", 0).await.unwrap();
        assert_eq!(index, 0);
        let (index, result) = chain.extract_from("7049", index + 1).await.unwrap();
        assert_eq!(index, 1);
        assert_eq!(result.media_urls, vec!["https://b/1"]);

        let err = chain.extract_from("7049", 2).await.unwrap_err();
        assert!(matches!(err, ResolveError::ChainExhausted { .. }));
    }

    #[tokio::test]
    async fn test_exhaustion_reports_last_error() {
        let mut chain = ExtractionChain::new();
        for name in ["a", "b", "c"] {
            chain.add_strategy(scripted(name, None).0);
        }

        let err = chain.extract("7049").await.unwrap_err();
        assert_eq!(err.strategy(), Some("c"));
        assert!(err.to_string().contains("c schema mismatch"));
    }

    #[tokio::test]
    async fn test_standard_chain_order() {
        let chain = ExtractionChain::standard(Arc::new(StubHttp::new()), Arc::new(LinkMap::new()), None);
        assert_eq!(chain.names(), vec!["item-info", "aweme-detail", "mirror"]);
    }

    #[tokio::test]
    async fn test_item_info_hit_skips_other_strategies() {
        let id = "7049";
        let detail_url = AwemeDetailExtractor::api_url(id);
        let http = Arc::new(StubHttp::new().with_json(
            &ItemInfoExtractor::api_url(id),
            json!({"item_list": [{"video": {
                "download_addr": {"url_list": ["https://d/1"]},
                "origin_cover": {"url_list": ["https://c/1"]}
            }}]}),
        ));
        let chain = ExtractionChain::standard(http.clone(), Arc::new(LinkMap::new()), None);

        let result = chain.extract(id).await.unwrap();
        assert_eq!(result, ExtractionResult::new("https://c/1", vec!["https://d/1".to_string()]));
        assert_eq!(http.calls(&detail_url), 0);
        assert_eq!(http.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_falls_through_to_mirror() {
        let id = "7049";
        let share = "https://v.douyin.com/LYDLoga/";
        let endpoint = "https://mirror.example.com/api?url=";
        let mirror_url = MirrorExtractor::api_url(endpoint, share);
        let http = Arc::new(
            StubHttp::new()
                .with_json(&ItemInfoExtractor::api_url(id), json!({"item_list": []}))
                .with_json(&AwemeDetailExtractor::api_url(id), json!({"aweme_detail": {}}))
                .with_json(&mirror_url, json!({"cover": "https://c/1", "audio": "https://a/1.mp3"})),
        );
        let links = Arc::new(LinkMap::new());
        links.insert(share, id);
        let chain = ExtractionChain::standard(http.clone(), links, Some(endpoint.to_string()));

        let result = chain.extract(id).await.unwrap();
        assert_eq!(result.media_urls, vec!["https://a/1.mp3"]);
        assert_eq!(http.calls(&mirror_url), 1);
    }

    #[tokio::test]
    async fn test_all_fail_surfaces_mirror_cause() {
        let id = "7049";
        let share = "https://v.douyin.com/LYDLoga/";
        let endpoint = "https://mirror.example.com/api?url=";
        let http = Arc::new(
            StubHttp::new()
                .with_json(&ItemInfoExtractor::api_url(id), json!({"item_list": []}))
                .with_json(&AwemeDetailExtractor::api_url(id), json!({"status_code": 0}))
                .with_json(&MirrorExtractor::api_url(endpoint, share), json!({"error": "busy"})),
        );
        let links = Arc::new(LinkMap::new());
        links.insert(share, id);
        let chain = ExtractionChain::standard(http, links, Some(endpoint.to_string()));

        let err = chain.extract(id).await.unwrap_err();
        assert!(matches!(err, ResolveError::ChainExhausted { .. }));
        assert_eq!(err.strategy(), Some("mirror"));
        assert!(err.to_string().contains("No `cover`"));
    }
}
