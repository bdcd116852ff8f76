// Error types for the resolution pipeline

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Share URL unreachable, or the redirect target carries no media id
    #[error("Unable to get media id from share url `{url}`, because: {reason}")]
    Resolution { url: String, reason: String },

    /// A single strategy could not make sense of its upstream response.
    /// Never surfaced on its own: the chain swallows it and moves on.
    #[error("[{strategy}] {cause}")]
    Extraction { strategy: &'static str, cause: String },

    /// Every strategy failed; carries the last one's error
    #[error("Unable to get the download url of the video, because: {last}")]
    ChainExhausted { last: Box<ResolveError> },

    /// Download failed or produced no bytes
    #[error("Fetch failed for `{url}`: {reason}")]
    Fetch { url: String, reason: String },

    /// Cover/audio missing or the encoder failed
    #[error("Unable to rebuild video {media_id}: {reason}")]
    Reconstruction { media_id: String, reason: String },

    #[error("Encoding config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResolveError {
    pub fn extraction(strategy: &'static str, cause: impl Into<String>) -> Self {
        Self::Extraction {
            strategy,
            cause: cause.into(),
        }
    }

    pub fn reconstruction(media_id: &str, reason: impl Into<String>) -> Self {
        Self::Reconstruction {
            media_id: media_id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn fetch(url: &str, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Name of the strategy that produced this error, if any
    pub fn strategy(&self) -> Option<&'static str> {
        match self {
            Self::Extraction { strategy, .. } => Some(strategy),
            Self::ChainExhausted { last } => last.strategy(),
            _ => None,
        }
    }
}
