use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use douyin_resolver_lib::resolver::ResolverConfig;

#[derive(Parser)]
#[command(name = "douyin-resolver")]
#[command(version)]
#[command(about = "Resolves Douyin share links into media URLs or media bytes")]
#[command(long_about = None)]
struct Cli {
    /// Listening IP address
    #[arg(short = 'H', long, env = "RESOLVER_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Listening port
    #[arg(short, long, env = "RESOLVER_PORT", default_value_t = 8080)]
    port: u16,

    /// Directory for cached covers, audio and rebuilt videos
    #[arg(long, env = "RESOLVER_CACHE_DIR", value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// JSON file holding the encoder `output_params`
    #[arg(long, env = "RESOLVER_ENCODING_CONFIG", value_name = "FILE")]
    encoding_config: Option<PathBuf>,

    /// Mirror parse service; the percent-encoded share URL is appended
    #[arg(long, env = "RESOLVER_MIRROR_ENDPOINT", value_name = "URL")]
    mirror_endpoint: Option<String>,

    /// Proxy for every outbound request (http, https or socks5)
    #[arg(long, env = "RESOLVER_PROXY", value_name = "URL")]
    proxy: Option<String>,

    /// Network timeout in seconds
    #[arg(long, env = "RESOLVER_TIMEOUT", default_value_t = 30)]
    timeout: u32,

    /// Encoder timeout in seconds
    #[arg(long, env = "RESOLVER_ENCODER_TIMEOUT", default_value_t = 120)]
    encoder_timeout: u64,

    /// Log level
    #[arg(short = 'v', long, env = "RESOLVER_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = if cli.log_level == "trace" {
        format!(
            "douyin_resolver_lib={0},douyin_resolver={0},tower_http=trace",
            cli.log_level
        )
    } else {
        format!("douyin_resolver_lib={0},douyin_resolver={0}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting douyin-resolver v{}", env!("CARGO_PKG_VERSION"));

    let mut config = ResolverConfig::default()
        .with_proxy(cli.proxy)
        .with_timeout(cli.timeout)
        .with_mirror_endpoint(cli.mirror_endpoint)
        .with_encoder_timeout(cli.encoder_timeout);
    if let Some(dir) = cli.cache_dir {
        config = config.with_cache_dir(dir);
    }
    if let Some(path) = cli.encoding_config {
        config = config.with_encoding_config_path(path);
    }

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    douyin_resolver_lib::run(addr, config).await
}
