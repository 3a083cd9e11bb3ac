use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iptv_aggregator::{
    config::{Config, ProbeStrategyKind},
    Pipeline,
};

#[derive(Parser)]
#[command(name = "iptv-aggregator")]
#[command(version = "0.1.0")]
#[command(about = "Aggregates IPTV playlists against a channel template with liveness ranking")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Channel template file path
    #[arg(short, long, default_value = "demo.txt")]
    template: PathBuf,

    /// Output directory (overrides config file)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Probe strategy: http or ffmpeg (overrides config file)
    #[arg(short, long, value_name = "STRATEGY")]
    probe: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with specified level
    let log_filter = format!("iptv_aggregator={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting IPTV aggregator v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration from specified file
    std::env::set_var("CONFIG_FILE", &cli.config);
    let mut config = Config::load()?;
    info!("Configuration loaded from: {}", cli.config);

    // Override config with CLI arguments
    if let Some(output_dir) = cli.output_dir {
        config.output.dir = output_dir;
    }
    if let Some(probe) = cli.probe.as_deref() {
        config.probe.strategy = match probe {
            "http" => ProbeStrategyKind::Http,
            "ffmpeg" => ProbeStrategyKind::Ffmpeg,
            other => anyhow::bail!("unknown probe strategy: {}", other),
        };
    }

    info!(
        "Using {} sources, probe strategy {:?}, output dir {}",
        config.sources.urls.len(),
        config.probe.strategy,
        config.output.dir.display()
    );

    let pipeline = Pipeline::new(config);
    let summary = pipeline.run(Path::new(&cli.template)).await?;

    info!(
        "Done: {} of {} template channels resolved, {} urls written",
        summary.resolved_channels, summary.template_channels, summary.urls_written
    );
    Ok(())
}
