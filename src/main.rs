use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use friend_finder::config::{Config, DEFAULT_CONFIG_PATH};
use friend_finder::kernel::reactor::{Reactor, ReactorConfig};
use friend_finder::services::notify::{AnyNotifier, GatewayNotifier, LogNotifier};
use friend_finder::services::queue::KeyedDelayQueue;
use friend_finder::services::steam::{PresenceFetcher, SteamClient};
use friend_finder::services::store::{AnyStore, FileStore, MemoryStore};

#[derive(Parser)]
#[command(name = "friend-finder", about = "Notify when friends start playing tracked games")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, short, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the roster and send confirmed notifications until Ctrl+C.
    Run,
    /// Fetch the roster once and print who counts as active. Writes nothing.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::Status => status(config).await,
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(config: Config) -> Result<()> {
    let fetcher = SteamClient::new(&config.steam)?;

    let store = match &config.store.path {
        Some(path) => AnyStore::File(FileStore::open(path).await?),
        None => {
            tracing::warn!("no store.path configured, presence is kept in memory only");
            AnyStore::Memory(MemoryStore::new())
        }
    };

    let notifier = match &config.notify.gateway_url {
        Some(url) => AnyNotifier::Gateway(GatewayNotifier::new(
            url.clone(),
            Duration::from_secs(config.notify.timeout_secs),
        )?),
        None => {
            tracing::warn!("no notify.gateway_url configured, notifications are only logged");
            AnyNotifier::Log(LogNotifier)
        }
    };

    let mut reactor = Reactor::new(
        ReactorConfig::from_config(&config),
        fetcher,
        store,
        notifier,
        KeyedDelayQueue::new(),
    );

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
        }
        trigger.cancel();
    });

    reactor.run(shutdown).await;
    Ok(())
}

async fn status(config: Config) -> Result<()> {
    let client = SteamClient::new(&config.steam)?;
    let tracked = config.tracked();
    let snapshots = client.fetch(&config.roster).await?;

    for snapshot in &snapshots {
        let verdict = if snapshot.is_active(&tracked) { "active" } else { "inactive" };
        println!(
            "{}\t{}\t{}\t{}",
            snapshot.id,
            verdict,
            snapshot.display_name,
            if snapshot.activity_label.is_empty() {
                snapshot.activity_id.as_str()
            } else {
                snapshot.activity_label.as_str()
            }
        );
    }
    for id in config.roster.iter().filter(|id| !snapshots.iter().any(|s| s.id == **id)) {
        println!("{}\tmissing", id);
    }
    Ok(())
}
