use super::util::with_retry;
use crate::core::config::FeedConfig;
use crate::core::feed::MarketFeed;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Fetches the published snapshot document with a single HTTP GET.
pub struct HttpMarketFeed {
    url: String,
    client: reqwest::Client,
    retries: usize,
    retry_delay: Duration,
}

impl HttpMarketFeed {
    pub fn new(url: &str, timeout: Duration, retries: usize, retry_delay: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("marketfeed/0.1")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            url: url.to_string(),
            client,
            retries,
            retry_delay,
        })
    }

    pub fn from_config(config: &FeedConfig) -> Result<Self> {
        Self::new(
            &config.url,
            config.timeout(),
            config.retries,
            config.retry_delay(),
        )
    }
}

#[async_trait]
impl MarketFeed for HttpMarketFeed {
    #[instrument(name = "MarketFeedFetch", skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<Vec<u8>> {
        let url = &self.url;
        let client = &self.client;

        with_retry(
            move || async move {
                debug!("Requesting market snapshot from {}", url);
                let response = client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| anyhow!("Request error: {} URL: {}", e, url))?;

                if !response.status().is_success() {
                    return Err(anyhow!("HTTP error: {} URL: {}", response.status(), url));
                }

                let body = response
                    .bytes()
                    .await
                    .context("Failed to read response body")?;
                debug!(bytes = body.len(), "Received market snapshot");
                Ok(body.to_vec())
            },
            self.retries,
            self.retry_delay,
        )
        .await
    }
}
