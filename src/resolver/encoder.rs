// External encoder seam
//
// Reconstruction turns a still cover and an audio track into an mp4 by running
// ffmpeg. The process is spawned, waited on with a timeout and its exit
// status checked; file cleanup is the caller's job.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use super::tools::{ToolManager, ToolType};
use super::utils::run_output_with_timeout;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("encoder could not be started: {0}")]
    Spawn(String),

    #[error("encoder exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("encoder finished but {0} was not written")]
    MissingOutput(PathBuf),
}

/// One encoder invocation
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub image: PathBuf,
    pub audio: PathBuf,
    pub output: PathBuf,
    /// Opaque parameter string, split on whitespace
    pub output_params: String,
    /// Container passed as `-f`; needed when `output` has no usable extension
    pub output_format: Option<String>,
}

impl EncodeJob {
    /// `-y -loop 1 -i <image> -i <audio> <params...> [-f <format>] <output>`
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-loop".to_string(),
            "1".to_string(),
            "-i".to_string(),
            self.image.to_string_lossy().into_owned(),
            "-i".to_string(),
            self.audio.to_string_lossy().into_owned(),
        ];
        args.extend(self.output_params.split_whitespace().map(str::to_string));
        if let Some(format) = &self.output_format {
            args.push("-f".to_string());
            args.push(format.clone());
        }
        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}

#[async_trait]
pub trait Encoder: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run the job to completion; `job.output` exists on success
    async fn encode(&self, job: &EncodeJob) -> Result<(), EncodeError>;
}

/// ffmpeg found on the host
pub struct FfmpegEncoder {
    binary_path: String,
    timeout_secs: u64,
}

impl FfmpegEncoder {
    pub fn new(timeout_secs: u64) -> Self {
        let manager = ToolManager::new();
        let binary_path = manager
            .get_tool_info(ToolType::Ffmpeg)
            .path
            .unwrap_or_else(|| "ffmpeg".to_string());

        Self {
            binary_path,
            timeout_secs,
        }
    }

    pub fn with_binary(binary_path: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            binary_path: binary_path.into(),
            timeout_secs,
        }
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn encode(&self, job: &EncodeJob) -> Result<(), EncodeError> {
        let args = job.args();
        debug!("[Encoder] {} {}", self.binary_path, args.join(" "));

        let output = run_output_with_timeout(&self.binary_path, args, self.timeout_secs)
            .await
            .map_err(EncodeError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // ffmpeg prints its banner first; the cause is at the end
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            let stderr = tail.into_iter().rev().collect::<Vec<_>>().join("\n");
            warn!("[Encoder] ffmpeg failed ({}): {}", output.status, stderr);
            return Err(EncodeError::Failed {
                status: output.status.to_string(),
                stderr,
            });
        }

        if !Path::new(&job.output).is_file() {
            return Err(EncodeError::MissingOutput(job.output.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(params: &str) -> EncodeJob {
        EncodeJob {
            image: PathBuf::from("/cache/7049.jpeg"),
            audio: PathBuf::from("/cache/7049.mp3"),
            output: PathBuf::from("/cache/7049.mp4"),
            output_params: params.to_string(),
            output_format: None,
        }
    }

    #[test]
    fn test_args_layout() {
        let args = job("-c:v libx264  -c:a copy").args();
        assert_eq!(
            args,
            vec![
                "-y",
                "-loop",
                "1",
                "-i",
                "/cache/7049.jpeg",
                "-i",
                "/cache/7049.mp3",
                "-c:v",
                "libx264",
                "-c:a",
                "copy",
                "/cache/7049.mp4",
            ]
        );
    }

    #[test]
    fn test_empty_params_still_names_output() {
        let args = job("").args();
        assert_eq!(args.last().map(String::as_str), Some("/cache/7049.mp4"));
        assert_eq!(args.len(), 8);
    }

    #[test]
    fn test_output_format_precedes_output() {
        let mut job = job("-c:a copy");
        job.output = PathBuf::from("/cache/7049.mp4.part-1-0");
        job.output_format = Some("mp4".to_string());

        let args = job.args();
        let tail: Vec<&str> = args.iter().rev().take(3).rev().map(String::as_str).collect();
        assert_eq!(tail, vec!["-f", "mp4", "/cache/7049.mp4.part-1-0"]);
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let encoder = FfmpegEncoder::with_binary("/nonexistent/ffmpeg-binary", 5);
        let result = encoder.encode(&job("")).await;
        assert!(matches!(result, Err(EncodeError::Spawn(_))));
    }
}
