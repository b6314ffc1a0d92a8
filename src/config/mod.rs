//! Configuration module for Statute-Loom
//!
//! Handles loading, parsing, and validating the TOML configuration file
//! that drives a crawl: the crawl root, retry and pacing policy, the
//! snapshot path, and the identifying user agent.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{Config, CrawlConfig, OutputConfig, UserAgentConfig};
pub use validation::validate;
