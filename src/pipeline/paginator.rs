use crate::model::PipelineError;
use crate::parser::{decode_html, parse_listing};
use crate::scraper::PageFetcher;
use std::collections::HashSet;
use tracing::{info, warn};

/// Walks a listing from `start_url` along "next page" links and returns every
/// card URL, page order first, card order within a page second.
///
/// Stops after `max_pages` pages or when a next link points back to a page
/// already visited.
pub async fn list_urls<F>(
    fetcher: &F,
    start_url: &str,
    max_pages: usize,
) -> Result<Vec<String>, PipelineError>
where
    F: PageFetcher + ?Sized,
{
    let mut urls = Vec::new();
    let mut visited = HashSet::new();
    let mut next = Some(start_url.to_string());
    let mut pages = 0;

    while let Some(page_url) = next.take() {
        if pages >= max_pages {
            warn!(
                "Page limit ({}) reached, not following {}",
                max_pages, page_url
            );
            break;
        }
        if !visited.insert(page_url.clone()) {
            warn!("Listing loops back to {}, stopping", page_url);
            break;
        }

        info!("Now scraping for URL: {}", page_url);
        let body = fetcher.fetch(&page_url).await?;
        let page = parse_listing(&decode_html(&body))?;
        pages += 1;

        urls.extend(page.urls);
        next = page.next_page;
    }

    info!("{} candidate(s) found on the web site.", urls.len());
    Ok(urls)
}
