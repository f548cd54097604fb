use crate::model::{Candidate, PipelineError, Species};
use crate::parser::{decode_html, parse_detail};
use crate::scraper::PageFetcher;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::info;

/// Fetches one detail page and extracts its record.
pub async fn extract_candidate<F>(
    fetcher: &F,
    url: &str,
    species: Species,
) -> Result<Candidate, PipelineError>
where
    F: PageFetcher + ?Sized,
{
    info!("Now scraping for candidate: {}", url);
    let body = fetcher.fetch(url).await?;
    Ok(parse_detail(&decode_html(&body), url, species)?)
}

/// Extracts every URL with at most `workers` requests in flight.
///
/// Output order follows `urls`. The first failure aborts the batch and is returned.
pub async fn fetch_all<F>(
    fetcher: &F,
    urls: &[String],
    species: Species,
    workers: usize,
) -> Result<Vec<Candidate>, PipelineError>
where
    F: PageFetcher + ?Sized,
{
    stream::iter(urls.iter().cloned())
        .map(|url| async move { extract_candidate(fetcher, &url, species).await })
        .buffered(workers.max(1))
        .try_collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::detail::tests::detail_html;
    use crate::pipeline::fake::FakeFetcher;
    use std::time::Duration;

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://s/a/{}", i)).collect()
    }

    fn fetcher_for(urls: &[String]) -> FakeFetcher {
        urls.iter()
            .enumerate()
            .fold(FakeFetcher::new(), |f, (i, u)| {
                f.with_page(u, detail_html(&format!("pet{}", i), &i.to_string()))
            })
            .with_delay(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn extracts_every_url_in_submission_order() {
        let input = urls(20);
        let fetcher = fetcher_for(&input);

        let out = fetch_all(&fetcher, &input, Species::Dog, 5).await.unwrap();

        assert_eq!(out.len(), 20);
        assert_eq!(fetcher.calls(), 20);
        for (i, (candidate, url)) in out.iter().zip(&input).enumerate() {
            assert_eq!(&candidate.url, url);
            assert_eq!(candidate.id, i.to_string());
            assert_eq!(candidate.species, Species::Dog);
        }
    }

    #[tokio::test]
    async fn never_exceeds_worker_limit() {
        let input = urls(20);
        let fetcher = fetcher_for(&input);

        fetch_all(&fetcher, &input, Species::Cat, 5).await.unwrap();

        let peak = fetcher.max_in_flight();
        assert!(peak <= 5, "peak concurrency was {}", peak);
        assert!(peak > 1, "requests never overlapped");
    }

    #[tokio::test]
    async fn one_failure_fails_the_batch() {
        let input = urls(20);
        let fetcher = fetcher_for(&input).failing_on(&input[7]);

        let err = fetch_all(&fetcher, &input, Species::Cat, 5).await.unwrap_err();
        assert!(matches!(err, PipelineError::Transport(_)));
    }

    #[tokio::test]
    async fn malformed_detail_page_fails_the_batch() {
        let input = urls(3);
        let fetcher = fetcher_for(&input).with_page(&input[1], "<html></html>".to_string());

        let err = fetch_all(&fetcher, &input, Species::Cat, 5).await.unwrap_err();
        assert!(matches!(err, PipelineError::Extraction(_)));
    }

    #[tokio::test]
    async fn empty_input_does_nothing() {
        let fetcher = FakeFetcher::new();
        let out = fetch_all(&fetcher, &[], Species::Cat, 5).await.unwrap();
        assert!(out.is_empty());
        assert_eq!(fetcher.calls(), 0);
    }
}
