// Common data models for the resolver

use regex::Regex;
use std::path::PathBuf;

/// Normalized output of every extraction strategy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Cover image URL, empty when the upstream has none
    pub cover_url: String,
    /// Media URLs in upstream preference order
    pub media_urls: Vec<String>,
}

impl ExtractionResult {
    pub fn new(cover_url: impl Into<String>, media_urls: Vec<String>) -> Self {
        Self {
            cover_url: cover_url.into(),
            media_urls,
        }
    }

    pub fn has_cover(&self) -> bool {
        !self.cover_url.is_empty()
    }
}

/// What the pipeline hands back to the request boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Urls(ExtractionResult),
    Bytes(Vec<u8>),
}

/// Kinds of files kept in the asset cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Cover,
    Audio,
    Video,
}

impl AssetKind {
    /// Fixed extension; covers take theirs from the HTTP content type
    pub fn default_extension(&self) -> &'static str {
        match self {
            Self::Cover => "jpeg",
            Self::Audio => "mp3",
            Self::Video => "mp4",
        }
    }
}

/// A file in the asset cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAsset {
    pub media_id: String,
    pub kind: AssetKind,
    pub path: PathBuf,
}

impl CachedAsset {
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

/// Whether a media URL points at a separated audio track
pub fn is_audio_url(url: &str) -> bool {
    lazy_static::lazy_static! {
        static ref AUDIO_RE: Regex = Regex::new(r"(?i)\.mp3(?:$|[?#])").unwrap();
    }
    AUDIO_RE.is_match(url)
}

/// Network configuration for outbound requests
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// SOCKS5/HTTP proxy URL (e.g., "socks5://127.0.0.1:1080")
    pub proxy: Option<String>,

    /// Timeout in seconds
    pub timeout: Option<u32>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout: Some(30),
        }
    }
}

/// Everything the pipeline needs to be built
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub network: NetworkConfig,
    /// Directory holding `<media_id>.<ext>` assets
    pub cache_dir: PathBuf,
    /// JSON side-file with `output_params`
    pub encoding_config_path: PathBuf,
    /// Mirror service the last strategy queries; the share URL is appended
    pub mirror_endpoint: Option<String>,
    /// Upper bound for a single encoder run
    pub encoder_timeout_seconds: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("douyin-resolver");
        let encoding_config_path = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("douyin-resolver")
            .join("encoding.json");

        Self {
            network: NetworkConfig::default(),
            cache_dir,
            encoding_config_path,
            mirror_endpoint: None,
            encoder_timeout_seconds: 120,
        }
    }
}

impl ResolverConfig {
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.network.proxy = proxy;
        self
    }

    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.network.timeout = Some(seconds);
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_encoding_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.encoding_config_path = path.into();
        self
    }

    pub fn with_mirror_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.mirror_endpoint = endpoint.filter(|e| !e.trim().is_empty());
        self
    }

    pub fn with_encoder_timeout(mut self, seconds: u64) -> Self {
        self.encoder_timeout_seconds = seconds;
        self
    }
}
