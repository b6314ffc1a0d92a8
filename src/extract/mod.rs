//! Extractor capability
//!
//! One operation per structural level. Each returns reference records
//! carrying the raw label string exactly as the site renders it; the
//! walker owns label parsing (see [`crate::label`]), so extractors stay
//! purely about locating things in a page.
//!
//! Expanding a title is the odd one out: the source site lazy-loads a
//! title's chapter list through an in-page action, so [`Extractor::expand_title`]
//! is async and waits until the child list is non-empty or a deadline
//! elapses. That wait is a suspension point of its own, distinct from page
//! navigation.

mod selectors;

pub use selectors::HtmlExtractor;

use crate::ExtractError;
use async_trait::async_trait;

/// A part as listed on the index page
#[derive(Debug, Clone)]
pub struct PartRef {
    /// Raw label, e.g. "Part I General Provisions Chapters. 1-24"
    pub label: String,
    /// Absolute URL of the part page
    pub url: String,
}

/// A title as listed on a part page
#[derive(Debug, Clone)]
pub struct TitleRef {
    /// Raw label, e.g. "Title IV Public Health"
    pub label: String,
    /// Lazy-load target embedded in the title node's markup
    pub expand_url: String,
}

/// A chapter revealed by expanding a title
#[derive(Debug, Clone)]
pub struct ChapterRef {
    /// Raw label, e.g. "Chapter 3A Boards and Commissions"
    pub label: String,
    /// Absolute URL of the chapter page
    pub url: String,
}

/// A section link on a chapter page
#[derive(Debug, Clone)]
pub struct SectionRef {
    /// Raw label, e.g. "§ 1-101. Definitions."
    pub label: String,
    /// Absolute URL of the section page
    pub url: String,
}

/// Extracted body of a section page
#[derive(Debug, Clone)]
pub struct SectionBody {
    /// Display heading, when the page carries one
    pub heading: Option<String>,
    /// Full text of the section; empty for repealed stubs
    pub text: String,
}

/// Capability to extract typed records from fetched pages, one variant per
/// level of the hierarchy.
#[async_trait]
pub trait Extractor: Send + Sync {
    type Page: Send + Sync;

    /// Parts listed on the top-level index page.
    fn part_refs(&self, page: &Self::Page) -> Result<Vec<PartRef>, ExtractError>;

    /// Titles listed on a part page.
    fn title_refs(&self, page: &Self::Page) -> Result<Vec<TitleRef>, ExtractError>;

    /// Triggers the lazy-load action for one title and waits until its
    /// chapter list is non-empty or the deadline elapses.
    async fn expand_title(
        &self,
        page: &Self::Page,
        title: &TitleRef,
    ) -> Result<Vec<ChapterRef>, ExtractError>;

    /// Section links on a chapter page.
    fn section_refs(&self, page: &Self::Page) -> Result<Vec<SectionRef>, ExtractError>;

    /// Heading and full text from a section page.
    fn section_body(&self, page: &Self::Page) -> Result<SectionBody, ExtractError>;
}
