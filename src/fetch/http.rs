//! HTTP page fetcher
//!
//! Builds a reqwest client with an identifying user agent and performs one
//! GET per fetch. Error classification follows the walker's needs: a
//! deadline overrun is a timeout (retryable, same unit), everything else is
//! a navigation failure with the underlying message.

use crate::config::UserAgentConfig;
use crate::fetch::{HtmlPage, PageFetcher};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// reqwest-backed [`PageFetcher`]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds the fetcher with a properly identifying HTTP client.
    pub fn new(user_agent: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent.header_value())
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }

    /// Wraps an existing client. Used by the extractor's expansion poll,
    /// which shares the session rather than opening a second one.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    type Page = HtmlPage;

    async fn fetch(&self, url: &str, timeout: Duration) -> Result<HtmlPage, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Navigation {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| classify(url, e))?;

        Ok(HtmlPage {
            url: final_url,
            body,
        })
    }
}

fn classify(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Navigation {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
