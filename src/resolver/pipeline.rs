// Resolution pipeline: share link -> media id -> media urls -> (optionally) bytes

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::cache::AssetCache;
use super::encoder::{Encoder, FfmpegEncoder};
use super::errors::ResolveError;
use super::extractors::ExtractionChain;
use super::fetcher::MediaFetcher;
use super::http::{HttpClient, HttpError, ReqwestClient};
use super::link::{LinkMap, LinkResolver};
use super::models::{is_audio_url, ExtractionResult, Resolved, ResolverConfig};
use super::reconstruct::Reconstructor;
use super::utils::friendly_size;

pub struct ResolutionPipeline {
    links: LinkResolver,
    chain: ExtractionChain,
    fetcher: Arc<MediaFetcher>,
    reconstructor: Reconstructor,
}

impl ResolutionPipeline {
    /// Pipeline backed by reqwest and the ffmpeg found on this machine
    pub fn new(config: &ResolverConfig) -> Result<Self, HttpError> {
        let http: Arc<dyn HttpClient> = Arc::new(ReqwestClient::new(&config.network)?);
        let encoder: Arc<dyn Encoder> = Arc::new(FfmpegEncoder::new(config.encoder_timeout_seconds));
        Ok(Self::with_parts(http, encoder, config))
    }

    pub fn with_parts(
        http: Arc<dyn HttpClient>,
        encoder: Arc<dyn Encoder>,
        config: &ResolverConfig,
    ) -> Self {
        let link_map = Arc::new(LinkMap::new());
        let fetcher = Arc::new(MediaFetcher::new(http.clone()));
        let cache = Arc::new(AssetCache::new(config.cache_dir.clone()));

        Self {
            links: LinkResolver::new(http.clone(), link_map.clone()),
            chain: ExtractionChain::standard(http, link_map, config.mirror_endpoint.clone()),
            reconstructor: Reconstructor::new(
                fetcher.clone(),
                cache,
                encoder,
                config.encoding_config_path.clone(),
            ),
            fetcher,
        }
    }

    pub fn link_map(&self) -> &Arc<LinkMap> {
        self.links.links()
    }

    pub async fn resolve_and_fetch(
        &self,
        share_url: &str,
        want_bytes: bool,
    ) -> Result<Resolved, ResolveError> {
        let media_id = self.links.resolve(share_url).await?;
        let (mut position, mut result) = self.chain.extract_from(&media_id, 0).await?;

        if !want_bytes {
            return Ok(Resolved::Urls(result));
        }

        let mut last_error = None;
        loop {
            if let Some(bytes) = self.fetch_first(&media_id, &result, &mut last_error).await {
                info!(
                    "[Pipeline] {} -> {} of media bytes",
                    media_id,
                    friendly_size(bytes.len())
                );
                return Ok(Resolved::Bytes(bytes));
            }

            // Nothing usable in this result, give the remaining strategies a turn
            if position + 1 >= self.chain.len() {
                break;
            }
            match self.chain.extract_from(&media_id, position + 1).await {
                Ok((next, next_result)) => {
                    position = next;
                    result = next_result;
                }
                Err(e) => {
                    debug!("[Pipeline] No further strategy for {}: {}", media_id, e);
                    break;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ResolveError::fetch(share_url, "no media bytes were produced")))
    }

    /// Try every url of `result` in order; the first non-empty payload wins
    async fn fetch_first(
        &self,
        media_id: &str,
        result: &ExtractionResult,
        last_error: &mut Option<ResolveError>,
    ) -> Option<Vec<u8>> {
        for url in &result.media_urls {
            let attempt = if is_audio_url(url) && result.has_cover() {
                self.reconstructor
                    .reconstruct(media_id, &result.cover_url, url)
                    .await
            } else {
                self.fetcher.fetch(url).await
            };

            match attempt {
                Ok(bytes) if !bytes.is_empty() => return Some(bytes),
                Ok(_) => {
                    warn!("[Pipeline] Empty body from {}", url);
                    *last_error = Some(ResolveError::fetch(url, "empty body"));
                }
                Err(e) => {
                    warn!("[Pipeline] {}", e);
                    *last_error = Some(e);
                }
            }
        }
        None
    }
}
