pub mod resolver;
pub mod server;

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use resolver::tools::{ToolManager, ToolType};
use resolver::{ResolutionPipeline, ResolverConfig};

/// Build the pipeline and serve it on `addr` until the process stops
pub async fn run(addr: SocketAddr, config: ResolverConfig) -> anyhow::Result<()> {
    let ffmpeg = ToolManager::new().get_tool_info(ToolType::Ffmpeg);
    if ffmpeg.is_available {
        info!(
            "[Server] ffmpeg {} at {}",
            ffmpeg.version.as_deref().unwrap_or("(unknown version)"),
            ffmpeg.path.as_deref().unwrap_or("ffmpeg")
        );
    } else {
        warn!("[Server] ffmpeg not found; audio-only posts cannot be rebuilt");
    }

    info!("[Server] Asset cache: {}", config.cache_dir.display());
    info!("[Server] Encoding config: {}", config.encoding_config_path.display());
    if config.mirror_endpoint.is_none() {
        warn!("[Server] No mirror endpoint configured; the mirror strategy will always fail");
    }

    let pipeline = ResolutionPipeline::new(&config).context("Failed to build HTTP client")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("[Server] Listening on {}", listener.local_addr()?);

    axum::serve(listener, server::router(Arc::new(pipeline))).await?;
    Ok(())
}
