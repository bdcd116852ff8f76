// Encoder parameters side-file
//
// `{"output_params": "..."}`. The file is created with the default on first
// access and read on every reconstruction, so edits apply without a restart.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use super::errors::ResolveError;

/// Fast, low-latency H.264 for the still image, audio copied through.
/// `-shortest` stops the looped image when the audio ends.
pub const DEFAULT_OUTPUT_PARAMS: &str =
    "-c:v libx264 -preset ultrafast -tune zerolatency -c:a copy -shortest";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingConfig {
    #[serde(default = "default_output_params")]
    pub output_params: String,
}

fn default_output_params() -> String {
    DEFAULT_OUTPUT_PARAMS.to_string()
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            output_params: default_output_params(),
        }
    }
}

impl EncodingConfig {
    /// Read `path`, writing the default there first if it does not exist
    pub async fn load_or_create(path: &Path) -> Result<Self, ResolveError> {
        if !path.exists() {
            let config = Self::default();
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let json = serde_json::to_string_pretty(&config)
                .map_err(|e| ResolveError::Config(e.to_string()))?;
            tokio::fs::write(path, json).await?;
            info!("[EncodingConfig] Created default config at {}", path.display());
            return Ok(config);
        }

        let text = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&text)
            .map_err(|e| ResolveError::Config(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_creates_default_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("encoding.json");

        let config = EncodingConfig::load_or_create(&path).await.unwrap();
        assert_eq!(config.output_params, DEFAULT_OUTPUT_PARAMS);

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["output_params"], DEFAULT_OUTPUT_PARAMS);
    }

    #[tokio::test]
    async fn test_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("encoding.json");
        std::fs::write(&path, r#"{"output_params": "-c:v libx265 -c:a aac"}"#).unwrap();

        let config = EncodingConfig::load_or_create(&path).await.unwrap();
        assert_eq!(config.output_params, "-c:v libx265 -c:a aac");
    }

    #[tokio::test]
    async fn test_missing_key_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("encoding.json");
        std::fs::write(&path, "{}").unwrap();

        let config = EncodingConfig::load_or_create(&path).await.unwrap();
        assert_eq!(config, EncodingConfig::default());
    }

    #[tokio::test]
    async fn test_invalid_json_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("encoding.json");
        std::fs::write(&path, "output_params = fast").unwrap();

        assert!(matches!(
            EncodingConfig::load_or_create(&path).await,
            Err(ResolveError::Config(_))
        ));
    }
}
