//! HTML extractor for the source site
//!
//! All site-specific knowledge lives here: which selectors hold the ground
//! truth at each level, and how the lazy-load expansion endpoint is
//! derived from a title node's markup. The rest of the crate only sees the
//! [`Extractor`] trait.

use crate::extract::{ChapterRef, Extractor, PartRef, SectionBody, SectionRef, TitleRef};
use crate::fetch::HtmlPage;
use crate::ExtractError;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

const PART_LINKS: &str = "ol.code-parts a.part-link[href]";
const TITLE_NODES: &str = "li.title-node[data-chapters-url]";
const CHAPTER_LINKS: &str = "a.chapter-link[href]";
const SECTION_LINKS: &str = "table.section-list a.section-link[href]";
const SECTION_HEADING: &str = "h2.section-heading";
const SECTION_TEXT: &str = "div.section-text";

/// How often the expansion endpoint is re-polled while its child list is
/// still empty
const EXPANSION_POLL: Duration = Duration::from_millis(500);

/// scraper-backed [`Extractor`] for the source site
pub struct HtmlExtractor {
    client: Client,
    expansion_timeout: Duration,
}

impl HtmlExtractor {
    /// The client is shared with the page fetcher so the expansion poll
    /// rides the same HTTP session.
    pub fn new(client: Client, expansion_timeout: Duration) -> Self {
        Self {
            client,
            expansion_timeout,
        }
    }
}

#[async_trait]
impl Extractor for HtmlExtractor {
    type Page = HtmlPage;

    fn part_refs(&self, page: &HtmlPage) -> Result<Vec<PartRef>, ExtractError> {
        let document = Html::parse_document(&page.body);
        let selector = parse_selector(PART_LINKS)?;

        let refs: Vec<PartRef> = document
            .select(&selector)
            .filter_map(|element| {
                let href = element.value().attr("href")?;
                let url = resolve(&page.url, href)?;
                Some(PartRef {
                    label: element_text(&element),
                    url,
                })
            })
            .collect();

        // An index page without part links is a broken page, not an empty code
        if refs.is_empty() {
            return Err(ExtractError::SelectorNotFound {
                selector: PART_LINKS.to_string(),
            });
        }

        Ok(refs)
    }

    fn title_refs(&self, page: &HtmlPage) -> Result<Vec<TitleRef>, ExtractError> {
        let document = Html::parse_document(&page.body);
        let selector = parse_selector(TITLE_NODES)?;

        let refs: Vec<TitleRef> = document
            .select(&selector)
            .filter_map(|element| {
                let target = element.value().attr("data-chapters-url")?;
                let expand_url = resolve(&page.url, target)?;
                Some(TitleRef {
                    label: element_text(&element),
                    expand_url,
                })
            })
            .collect();

        if refs.is_empty() {
            return Err(ExtractError::SelectorNotFound {
                selector: TITLE_NODES.to_string(),
            });
        }

        Ok(refs)
    }

    async fn expand_title(
        &self,
        _page: &HtmlPage,
        title: &TitleRef,
    ) -> Result<Vec<ChapterRef>, ExtractError> {
        let deadline = Instant::now() + self.expansion_timeout;

        // The site populates the chapter list asynchronously after the
        // expansion action fires; an empty fragment means "not ready yet",
        // so poll until it fills in or the deadline passes.
        loop {
            let request = self
                .client
                .get(&title.expand_url)
                .timeout(deadline.duration_since(Instant::now()).max(EXPANSION_POLL));
            if let Ok(body) = request.send().await {
                if let Ok(fragment) = body.text().await {
                    let chapters = parse_chapter_fragment(&fragment, &title.expand_url)?;
                    if !chapters.is_empty() {
                        return Ok(chapters);
                    }
                }
            }

            if Instant::now() + EXPANSION_POLL > deadline {
                return Err(ExtractError::ExpansionTimeout {
                    title: title.label.clone(),
                });
            }
            tokio::time::sleep(EXPANSION_POLL).await;
        }
    }

    fn section_refs(&self, page: &HtmlPage) -> Result<Vec<SectionRef>, ExtractError> {
        let document = Html::parse_document(&page.body);
        let selector = parse_selector(SECTION_LINKS)?;

        // A chapter page can legitimately list zero sections (fully
        // reserved chapters), so an empty result is not an error here.
        Ok(document
            .select(&selector)
            .filter_map(|element| {
                let href = element.value().attr("href")?;
                let url = resolve(&page.url, href)?;
                Some(SectionRef {
                    label: element_text(&element),
                    url,
                })
            })
            .collect())
    }

    fn section_body(&self, page: &HtmlPage) -> Result<SectionBody, ExtractError> {
        let document = Html::parse_document(&page.body);

        let heading = parse_selector(SECTION_HEADING).ok().and_then(|sel| {
            document
                .select(&sel)
                .next()
                .map(|e| element_text(&e))
                .filter(|s| !s.is_empty())
        });

        let text_selector = parse_selector(SECTION_TEXT)?;
        let text = document
            .select(&text_selector)
            .next()
            .ok_or_else(|| ExtractError::SelectorNotFound {
                selector: SECTION_TEXT.to_string(),
            })?;

        Ok(SectionBody {
            heading,
            text: block_text(&text),
        })
    }
}

/// Parses a chapter-list fragment returned by the expansion endpoint.
fn parse_chapter_fragment(fragment: &str, base: &str) -> Result<Vec<ChapterRef>, ExtractError> {
    let document = Html::parse_fragment(fragment);
    let selector = parse_selector(CHAPTER_LINKS)?;

    Ok(document
        .select(&selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            let url = resolve(base, href)?;
            Some(ChapterRef {
                label: element_text(&element),
                url,
            })
        })
        .collect())
}

fn parse_selector(spec: &str) -> Result<Selector, ExtractError> {
    Selector::parse(spec).map_err(|_| ExtractError::SelectorNotFound {
        selector: spec.to_string(),
    })
}

/// Collapses an element's text to a single whitespace-normalized line.
fn element_text(element: &scraper::ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts a block element's text, keeping paragraph breaks.
fn block_text(element: &scraper::ElementRef) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    for child in element.children().filter_map(scraper::ElementRef::wrap) {
        let text = element_text(&child);
        if !text.is_empty() {
            paragraphs.push(text);
        }
    }

    if paragraphs.is_empty() {
        element_text(element)
    } else {
        paragraphs.join("\n\n")
    }
}

/// Resolves an href against the page URL, keeping only http(s) results.
fn resolve(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }

    let base = Url::parse(base).ok()?;
    let absolute = base.join(href).ok()?;
    if absolute.scheme() == "http" || absolute.scheme() == "https" {
        Some(absolute.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> HtmlPage {
        HtmlPage {
            url: "https://law.example.gov/code/index".to_string(),
            body: body.to_string(),
        }
    }

    fn extractor() -> HtmlExtractor {
        HtmlExtractor::new(Client::new(), Duration::from_secs(5))
    }

    #[test]
    fn test_part_refs_extracted() {
        let html = r#"<html><body><ol class="code-parts">
            <li><a class="part-link" href="/parts/I">Part I General Provisions Chapters. 1-24</a></li>
            <li><a class="part-link" href="/parts/II">Part II Judiciary Chapters. 25-40</a></li>
        </ol></body></html>"#;

        let refs = extractor().part_refs(&page(html)).unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(
            refs[0].label,
            "Part I General Provisions Chapters. 1-24"
        );
        assert_eq!(refs[0].url, "https://law.example.gov/parts/I");
    }

    #[test]
    fn test_part_refs_missing_container_is_error() {
        let html = r#"<html><body><p>Maintenance page</p></body></html>"#;
        let result = extractor().part_refs(&page(html));
        assert!(matches!(
            result,
            Err(ExtractError::SelectorNotFound { .. })
        ));
    }

    #[test]
    fn test_title_refs_carry_expansion_target() {
        let html = r#"<html><body><ul>
            <li class="title-node" data-chapters-url="/ajax/chapters?title=IV">Title IV Public Health</li>
            <li class="title-node">Title V No Target</li>
        </ul></body></html>"#;

        let refs = extractor().title_refs(&page(html)).unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].label, "Title IV Public Health");
        assert_eq!(
            refs[0].expand_url,
            "https://law.example.gov/ajax/chapters?title=IV"
        );
    }

    #[test]
    fn test_chapter_fragment_parsed() {
        let fragment = r#"<ul>
            <li><a class="chapter-link" href="/chapters/3A">Chapter 3A Boards and Commissions</a></li>
            <li><a class="chapter-link" href="/chapters/4">Chapter 4 Personnel</a></li>
        </ul>"#;

        let chapters =
            parse_chapter_fragment(fragment, "https://law.example.gov/ajax/chapters").unwrap();
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[1].url, "https://law.example.gov/chapters/4");
    }

    #[test]
    fn test_section_refs_may_be_empty() {
        let html = r#"<html><body><table class="section-list"></table></body></html>"#;
        let refs = extractor().section_refs(&page(html)).unwrap();
        assert!(refs.is_empty());
    }

    #[test]
    fn test_section_refs_extracted() {
        let html = r#"<html><body><table class="section-list">
            <tr><td><a class="section-link" href="/sections/1-101">§ 1-101. Definitions.</a></td></tr>
        </table></body></html>"#;

        let refs = extractor().section_refs(&page(html)).unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].label, "§ 1-101. Definitions.");
        assert_eq!(refs[0].url, "https://law.example.gov/sections/1-101");
    }

    #[test]
    fn test_section_body_with_paragraphs() {
        let html = r#"<html><body>
            <h2 class="section-heading">§ 1-101. Definitions.</h2>
            <div class="section-text">
                <p>First paragraph.</p>
                <p>Second   paragraph.</p>
            </div>
        </body></html>"#;

        let body = extractor().section_body(&page(html)).unwrap();
        assert_eq!(body.heading.as_deref(), Some("§ 1-101. Definitions."));
        assert_eq!(body.text, "First paragraph.\n\nSecond paragraph.");
    }

    #[test]
    fn test_section_body_missing_text_block_is_error() {
        let html = r#"<html><body><h2 class="section-heading">§ 1-101.</h2></body></html>"#;
        let result = extractor().section_body(&page(html));
        assert!(matches!(
            result,
            Err(ExtractError::SelectorNotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_relative_and_filtered_links() {
        let base = "https://law.example.gov/chapters/3A";
        assert_eq!(
            resolve(base, "/sections/1-101").as_deref(),
            Some("https://law.example.gov/sections/1-101")
        );
        assert_eq!(resolve(base, "#anchor"), None);
        assert_eq!(resolve(base, "javascript:void(0)"), None);
        assert_eq!(resolve(base, "mailto:x@y.gov"), None);
    }
}
