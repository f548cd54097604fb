// Glue between the store and the pipeline: one scrape-and-persist run, one notify run
use crate::config::AppConfig;
use crate::model::{Candidate, ChannelKind, StorageError};
use crate::notifier::{notify_candidates, ErrorPolicy, NotificationSink};
use crate::pipeline::{self, CycleOutcome};
use crate::scraper::PageFetcher;
use crate::storage::SqliteStorage;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Diffs the site against the store snapshot and writes the new records.
/// Records of species scraped before a failure are still written.
pub async fn scrape_and_persist<F>(
    fetcher: &F,
    storage: &Mutex<SqliteStorage>,
    config: &AppConfig,
    now: DateTime<Utc>,
) -> Result<CycleOutcome, StorageError>
where
    F: PageFetcher + ?Sized,
{
    info!("Start scraping data.");
    // an unusable window treats every stored record as known
    let cutoff = config
        .known_window()
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let known_urls: Vec<String> = storage
        .lock()
        .await
        .known_since(cutoff)?
        .into_iter()
        .map(|c| c.url)
        .collect();
    info!("{} candidate(s) found in database.", known_urls.len());

    let outcome = pipeline::scrape_cycle(fetcher, config, &known_urls).await;

    let inserted = storage.lock().await.insert_new(&outcome.candidates, now)?;
    info!("{} new candidate(s) saved.", inserted);
    match serde_json::to_string(&outcome.candidates) {
        Ok(json) => info!("New candidates: {}", json),
        Err(e) => warn!("Cannot serialize new candidates: {}", e),
    }

    Ok(outcome)
}

/// Sends the oldest pending records to the channel and stores the updated flags.
pub async fn notify_pending<S>(
    sink: &S,
    storage: &Mutex<SqliteStorage>,
    config: &AppConfig,
    kind: ChannelKind,
) -> Result<Vec<Candidate>, StorageError>
where
    S: NotificationSink + ?Sized,
{
    let channel = config.channel(kind);
    info!("Start notify new candidates ({:?}).", kind);

    let pending = storage.lock().await.pending(kind, config.notify_batch_size)?;
    info!(
        "{} candidate(s) found that is not notified in database.",
        pending.len()
    );
    if pending.is_empty() {
        return Ok(pending);
    }

    let updated = notify_candidates(sink, pending, &channel, ErrorPolicy::from(config)).await;
    storage.lock().await.update_flags(&updated)?;

    Ok(updated)
}
