// Scrape-and-diff pipeline: listing traversal, novelty filter, concurrent detail extraction
pub mod novelty;
pub mod orchestrator;
pub mod paginator;

pub use novelty::filter_new_urls;
pub use orchestrator::fetch_all;
pub use paginator::list_urls;

use crate::config::AppConfig;
use crate::model::{Candidate, PipelineError, Species};
use crate::scraper::PageFetcher;
use tracing::{error, info};

#[derive(Debug, Clone, Copy)]
pub struct ScrapeSettings {
    pub workers: usize,
    pub max_pages: usize,
}

impl From<&AppConfig> for ScrapeSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            workers: config.workers,
            max_pages: config.max_pages,
        }
    }
}

/// Result of a multi-species scrape. Species finished before a failure keep
/// their records; `failure` names the species that aborted the cycle.
#[derive(Debug, Default)]
pub struct CycleOutcome {
    pub candidates: Vec<Candidate>,
    pub failure: Option<(Species, PipelineError)>,
}

/// Lists one species, drops URLs already known and extracts the rest.
pub async fn scrape_species<F>(
    fetcher: &F,
    species: Species,
    listing_url: &str,
    known_urls: &[String],
    settings: ScrapeSettings,
) -> Result<Vec<Candidate>, PipelineError>
where
    F: PageFetcher + ?Sized,
{
    let urls = list_urls(fetcher, listing_url, settings.max_pages).await?;
    let new_urls = filter_new_urls(known_urls.iter().map(String::as_str), &urls);
    fetch_all(fetcher, &new_urls, species, settings.workers).await
}

/// Runs `scrape_species` for every species in turn. The first failing species
/// stops the cycle.
pub async fn scrape_cycle<F>(fetcher: &F, config: &AppConfig, known_urls: &[String]) -> CycleOutcome
where
    F: PageFetcher + ?Sized,
{
    let settings = ScrapeSettings::from(config);
    let mut outcome = CycleOutcome::default();

    for species in Species::ALL {
        let listing_url = config.listing_url(species);
        match scrape_species(fetcher, species, &listing_url, known_urls, settings).await {
            Ok(found) => {
                info!("{}: {} new candidate(s) extracted", species, found.len());
                outcome.candidates.extend(found);
            }
            Err(e) => {
                error!("Error while scraping {}: {}", species, e);
                outcome.failure = Some((species, e));
                break;
            }
        }
    }

    outcome
}

/// Scrapes every listed record for every species, ignoring the store.
pub async fn preview<F>(fetcher: &F, config: &AppConfig) -> Result<Vec<Candidate>, PipelineError>
where
    F: PageFetcher + ?Sized,
{
    let settings = ScrapeSettings::from(config);
    let mut candidates = Vec::new();

    for species in Species::ALL {
        let urls = list_urls(fetcher, &config.listing_url(species), settings.max_pages).await?;
        candidates.extend(fetch_all(fetcher, &urls, species, settings.workers).await?);
    }

    Ok(candidates)
}

#[cfg(test)]
pub(crate) mod fake {
    use crate::model::ScraperError;
    use crate::scraper::PageFetcher;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// In-memory fetcher serving fixed pages; unknown URLs answer 404.
    #[derive(Default)]
    pub(crate) struct FakeFetcher {
        pages: HashMap<String, String>,
        failing: HashSet<String>,
        delay: Duration,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeFetcher {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
            self.pages.insert(url.to_string(), html.into());
            self
        }

        pub(crate) fn failing_on(mut self, url: &str) -> Self {
            self.failing.insert(url.to_string());
            self
        }

        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub(crate) fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, ScraperError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing.contains(url) {
                return Err(ScraperError::Http {
                    url: url.to_string(),
                    message: "connection reset".into(),
                });
            }
            self.pages
                .get(url)
                .map(|html| html.clone().into_bytes())
                .ok_or_else(|| ScraperError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }
}
