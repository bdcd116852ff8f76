// Video reconstruction from a cover image and a separated audio track
//
// Some posts only expose an mp3 plus a cover. The cover is looped as a still
// frame over the audio and encoded into `<cache>/<media_id>.mp4`.
//
// Runs for the same media id are serialized: the assets of one run are only
// written, encoded, read back or purged while it holds that id's lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use super::cache::{suffix_from_content_type, AssetCache};
use super::config::EncodingConfig;
use super::encoder::{EncodeJob, Encoder};
use super::errors::ResolveError;
use super::fetcher::MediaFetcher;
use super::models::{AssetKind, CachedAsset};
use super::utils::friendly_size;

lazy_static::lazy_static! {
    // Keyed by output path so separate reconstructors sharing a cache agree
    static ref IN_FLIGHT: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>> = Mutex::new(HashMap::new());
}

fn lock_for(output: &Path) -> Arc<AsyncMutex<()>> {
    let mut in_flight = IN_FLIGHT.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    in_flight.entry(output.to_path_buf()).or_default().clone()
}

/// Drop the entry once no run holds or waits on it
fn release(output: &Path) {
    let mut in_flight = IN_FLIGHT.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if in_flight
        .get(output)
        .is_some_and(|lock| Arc::strong_count(lock) == 1)
    {
        in_flight.remove(output);
    }
}

pub struct Reconstructor {
    fetcher: Arc<MediaFetcher>,
    cache: Arc<AssetCache>,
    encoder: Arc<dyn Encoder>,
    encoding_config_path: PathBuf,
}

impl Reconstructor {
    pub fn new(
        fetcher: Arc<MediaFetcher>,
        cache: Arc<AssetCache>,
        encoder: Arc<dyn Encoder>,
        encoding_config_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            cache,
            encoder,
            encoding_config_path: encoding_config_path.into(),
        }
    }

    pub async fn reconstruct(
        &self,
        media_id: &str,
        cover_url: &str,
        audio_url: &str,
    ) -> Result<Vec<u8>, ResolveError> {
        info!("[Reconstructor] Rebuilding {} from cover + audio", media_id);

        // Both downloads must succeed before anything touches the disk
        let cover = self
            .fetcher
            .fetch_media(cover_url)
            .await
            .map_err(|e| ResolveError::reconstruction(media_id, format!("cover: {}", e)))?;
        if cover.bytes.is_empty() {
            return Err(ResolveError::reconstruction(media_id, "empty cover"));
        }

        let audio = self
            .fetcher
            .fetch(audio_url)
            .await
            .map_err(|e| ResolveError::reconstruction(media_id, format!("audio: {}", e)))?;
        if audio.is_empty() {
            return Err(ResolveError::reconstruction(media_id, "empty audio"));
        }

        self.cache.ensure_dir().await?;

        let suffix = suffix_from_content_type(cover.content_type.as_deref());
        let cover_asset = self.cache.asset(media_id, AssetKind::Cover, &suffix);
        let audio_asset = self
            .cache
            .asset(media_id, AssetKind::Audio, AssetKind::Audio.default_extension());
        let video_asset = self
            .cache
            .asset(media_id, AssetKind::Video, AssetKind::Video.default_extension());

        let lock = lock_for(&video_asset.path);
        let result = {
            let _guard = lock.lock().await;
            debug!("[Reconstructor] Holding lock for {}", media_id);

            let result = self
                .encode(media_id, &cover_asset, &cover.bytes, &audio_asset, &audio, &video_asset)
                .await;
            if let Err(e) = &result {
                warn!("[Reconstructor] {} failed, purging assets: {}", media_id, e);
                for asset in [&cover_asset, &audio_asset, &video_asset] {
                    self.cache.remove(asset).await;
                }
            }
            result
        };
        drop(lock);
        release(&video_asset.path);

        let bytes = result?;
        info!(
            "[Reconstructor] {} rebuilt, size: {}",
            media_id,
            friendly_size(bytes.len())
        );
        Ok(bytes)
    }

    async fn encode(
        &self,
        media_id: &str,
        cover_asset: &CachedAsset,
        cover: &[u8],
        audio_asset: &CachedAsset,
        audio: &[u8],
        video_asset: &CachedAsset,
    ) -> Result<Vec<u8>, ResolveError> {
        self.cache.write_if_absent(cover_asset, cover).await?;
        self.cache.write_if_absent(audio_asset, audio).await?;

        let config = EncodingConfig::load_or_create(&self.encoding_config_path).await?;
        let staging = self.cache.staging_path(video_asset);
        let job = EncodeJob {
            image: cover_asset.path.clone(),
            audio: audio_asset.path.clone(),
            output: staging.clone(),
            output_params: config.output_params,
            output_format: Some(AssetKind::Video.default_extension().to_string()),
        };

        if let Err(e) = self.encoder.encode(&job).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(ResolveError::reconstruction(
                media_id,
                format!("{}: {}", self.encoder.name(), e),
            ));
        }
        self.cache.commit(&staging, video_asset).await?;

        let bytes = tokio::fs::read(&video_asset.path).await?;
        if bytes.is_empty() {
            return Err(ResolveError::reconstruction(media_id, "encoder produced an empty file"));
        }
        Ok(bytes)
    }
}
