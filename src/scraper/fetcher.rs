use crate::config::AppConfig;
use crate::model::ScraperError;
use crate::scraper::traits::PageFetcher;

use reqwest::Client;
use tracing::debug;

/// Plain GET fetcher with a browser-like identity and a per-request timeout.
/// No retries: callers decide what a failed page means.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &AppConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ScraperError::Http {
                url: String::new(),
                message: format!("cannot build HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> ScraperError {
    if e.is_timeout() {
        ScraperError::Timeout { url: url.to_string() }
    } else {
        ScraperError::Http {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ScraperError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| transport_error(url, e))?;
        Ok(body.to_vec())
    }
}
