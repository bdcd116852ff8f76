// Flat-file asset cache: `<dir>/<media_id>.<ext>`
//
// Presence on disk is the only existence check. Writes land in a temporary
// sibling and are renamed into place, so a reader never sees half a file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use super::models::{AssetKind, CachedAsset};

static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

pub struct AssetCache {
    dir: PathBuf,
}

impl AssetCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    pub fn asset(&self, media_id: &str, kind: AssetKind, extension: &str) -> CachedAsset {
        CachedAsset {
            media_id: media_id.to_string(),
            kind,
            path: self.dir.join(format!("{}.{}", media_id, extension)),
        }
    }

    /// Unique sibling of `asset` to stage a write in, e.g. `7049.mp4.part-12-3`
    pub fn staging_path(&self, asset: &CachedAsset) -> PathBuf {
        let extension = asset
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        asset.path.with_extension(format!(
            "{}.part-{}-{}",
            extension,
            std::process::id(),
            WRITE_SEQ.fetch_add(1, Ordering::Relaxed)
        ))
    }

    /// Move a fully written staging file over `asset`
    pub async fn commit(&self, staging: &Path, asset: &CachedAsset) -> std::io::Result<()> {
        if let Err(e) = tokio::fs::rename(staging, &asset.path).await {
            let _ = tokio::fs::remove_file(staging).await;
            return Err(e);
        }
        Ok(())
    }

    /// Write `bytes` unless the asset already exists. Returns whether it wrote.
    pub async fn write_if_absent(&self, asset: &CachedAsset, bytes: &[u8]) -> std::io::Result<bool> {
        if asset.exists() {
            debug!("[AssetCache] Reusing {}", asset.path.display());
            return Ok(false);
        }

        let staging = self.staging_path(asset);
        tokio::fs::write(&staging, bytes).await?;
        self.commit(&staging, asset).await?;

        debug!("[AssetCache] Wrote {} ({} bytes)", asset.path.display(), bytes.len());
        Ok(true)
    }

    /// Best-effort removal; failures are ignored
    pub async fn remove(&self, asset: &CachedAsset) {
        if tokio::fs::remove_file(&asset.path).await.is_ok() {
            debug!("[AssetCache] Removed {}", asset.path.display());
        }
    }
}

/// `image/png` -> `png`, `image/jpeg; charset=binary` -> `jpeg`, `webp` -> `webp`
pub fn suffix_from_content_type(content_type: Option<&str>) -> String {
    let essence = content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .unwrap_or("");

    let suffix = match essence.split_once('/') {
        Some((_, subtype)) => subtype,
        None => essence,
    };

    if suffix.is_empty() {
        AssetKind::Cover.default_extension().to_string()
    } else {
        suffix.to_ascii_lowercase()
    }
}
