mod config;
mod cycle;
mod model;
mod notifier;
mod parser;
mod pipeline;
mod scraper;
mod storage;
mod utils;

use chrono::Utc;
use config::{load_config, AppConfig};
use model::ChannelKind;
use notifier::TelegramNotifier;
use crate::scraper::HttpFetcher;
use std::sync::Arc;
use storage::SqliteStorage;
use tokio::sync::{Mutex, Notify};
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let config: Arc<AppConfig> = match load_config(&config_path) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error ({}): {}", config_path, e);
            return;
        }
    };

    let storage = match SqliteStorage::new(&config.db_path) {
        Ok(s) => Arc::new(Mutex::new(s)),
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            return;
        }
    };

    let fetcher = match HttpFetcher::new(&config) {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to build page fetcher: {}", e);
            return;
        }
    };

    // Notifier doubles as the command listener; /refresh wakes the main loop
    let refresh_notify = Arc::new(Notify::new());
    let notifier = match TelegramNotifier::new(
        config.clone(),
        storage.clone(),
        fetcher.clone(),
        refresh_notify.clone(),
    ) {
        Ok(n) => Arc::new(n),
        Err(e) => {
            error!("Failed to initialize notifier: {}", e);
            return;
        }
    };

    if let Err(e) = notifier.set_my_commands().await {
        warn!("setMyCommands failed: {:?}", e);
    }
    TelegramNotifier::spawn_listener(notifier.clone());

    info!("Sending startup message...");
    if let Err(e) = notifier
        .notify_text(notifier.ops_chat_id(), "🚀 Adopt watcher started!")
        .await
    {
        warn!("Startup notification failed: {:?}", e);
    }

    loop {
        run_cycle(&fetcher, &storage, &notifier, &config).await;

        info!(
            "Waiting for timer ({}s) or manual refresh...",
            config.check_interval_seconds
        );
        tokio::select! {
            _ = sleep(Duration::from_secs(config.check_interval_seconds)) => {
                info!("Timer triggered.");
            }
            _ = refresh_notify.notified() => {
                info!("Manual refresh triggered.");
            }
        }
    }
}

/// One full round: scrape and persist, then notify both channels.
async fn run_cycle(
    fetcher: &HttpFetcher,
    storage: &Mutex<SqliteStorage>,
    notifier: &TelegramNotifier,
    config: &AppConfig,
) {
    let started = Utc::now();

    match cycle::scrape_and_persist(fetcher, storage, config, started).await {
        Ok(outcome) => {
            if let Some((species, e)) = &outcome.failure {
                warn!("Scrape of {} aborted: {}", species, e);
            }
        }
        Err(e) => error!("Scrape cycle failed: {}", e),
    }

    for kind in [ChannelKind::All, ChannelKind::Cat] {
        if let Err(e) = cycle::notify_pending(notifier, storage, config, kind).await {
            error!("Notify cycle ({:?}) failed: {}", kind, e);
        }
    }

    info!("Cycle started at {} finished.", started.to_rfc3339());
}
