//! Page fetcher capability
//!
//! The walker treats navigation as an opaque capability: give it a URL and
//! a deadline, get back a page handle the extractor can read. The shipped
//! implementation is [`HttpFetcher`]; tests inject in-memory fakes through
//! the same trait.

mod http;

pub use http::HttpFetcher;

use crate::FetchError;
use async_trait::async_trait;
use std::time::Duration;

/// Capability to navigate to a URL and return a queryable page handle.
///
/// A fetch blocks until the page is ready or the timeout elapses, then
/// fails with [`FetchError::Timeout`] or [`FetchError::Navigation`]. The
/// walker never interleaves fetches: fetch plus extraction is one
/// suspension point.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    type Page: Send + Sync;

    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Self::Page, FetchError>;
}

/// A fetched page: the final URL and the raw HTML body.
///
/// The body is kept as a string and parsed on demand by the extractor, so
/// the handle stays cheap to move between suspension points.
#[derive(Debug, Clone)]
pub struct HtmlPage {
    pub url: String,
    pub body: String,
}
