use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use biliwatch_common::Config;
use biliwatch_monitor::dedup::DedupStore;
use biliwatch_monitor::notify;
use biliwatch_monitor::pacing::Pacing;
use biliwatch_monitor::poller::Poller;
use biliwatch_monitor::providers::provider_chain;
use biliwatch_monitor::retry::RetryPolicy;

#[derive(Parser)]
#[command(name = "biliwatch-monitor", about = "Bilibili keyword monitor")]
struct Cli {
    /// Path to the JSON config file (created with defaults if missing)
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Path to the processed-keys state file
    #[arg(long, default_value = "processed_videos.json")]
    state: PathBuf,

    /// Run a single cycle and exit instead of polling on an interval
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Biliwatch monitor starting...");

    let cli = Cli::parse();

    // Load config, materializing the default file on first run
    let config = Config::load_or_init(&cli.config)?;
    info!(
        keywords = config.search_keywords.len(),
        mode = %config.mode,
        send_count = config.send_count,
        interval_secs = config.check_interval_seconds,
        "Config loaded"
    );

    // Load dedup state (missing or corrupt files start fresh)
    let store = DedupStore::load(&cli.state);

    // Wire the pipeline
    let notifier = notify::from_env();
    let providers = provider_chain(&config);
    let retry = RetryPolicy::new(
        config.max_retries,
        Duration::from_secs(config.retry_backoff_secs),
    );
    let pacing = Pacing::standard();

    let mut poller = Poller::new(config, providers, retry, pacing, notifier, store);

    if cli.once {
        poller.run_cycle().await;
        Ok(())
    } else {
        poller.run().await
    }
}
