use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Statute-Loom
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Root URL of the code's top-level index page
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Attempts per unit of work before giving up on it
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Fixed backoff between retry attempts (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Upper bound for a single page fetch or expansion wait (milliseconds)
    #[serde(rename = "step-timeout-ms")]
    pub step_timeout_ms: u64,

    /// Pacing delay after each page load and each processed section
    /// (milliseconds)
    #[serde(rename = "pace-delay-ms")]
    pub pace_delay_ms: u64,
}

impl CrawlConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }

    pub fn pace_delay(&self) -> Duration {
        Duration::from_millis(self.pace_delay_ms)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value: Name/Version (+URL; Email)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the JSON snapshot file (artifact and resume checkpoint)
    #[serde(rename = "snapshot-path")]
    pub snapshot_path: String,
}
