use crate::model::ScraperError;

/// Fetches one page and returns its raw body. Decoding is left to the caller.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ScraperError>;
}
