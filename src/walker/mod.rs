//! Tree walker - main traversal orchestration
//!
//! Drives the four-level walk (Parts → Titles → Chapters → Sections),
//! coordinating fetch, extraction, and retry per node:
//! - Structural levels are always re-discovered from the live site
//! - Section bodies are fetched only when the persisted copy is incomplete
//! - Each completed chapter is merged into the document and persisted
//! - Node failures terminate their own subtree, never the walk

mod retry;

pub use retry::run_with_retry;

use crate::config::{Config, CrawlConfig};
use crate::document::{Chapter, Document, Part, Section, Title};
use crate::extract::{ChapterRef, Extractor, HtmlExtractor, PartRef, SectionRef, TitleRef};
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::label::{LabelPattern, LabelRules, ParsedLabel};
use crate::state::NodeState;
use crate::stats::CrawlStats;
use crate::store::{merge, SnapshotStore};
use crate::{LoomError, Result};

/// Walks the source site's hierarchy and folds results into the store.
pub struct Walker<F, E> {
    fetcher: F,
    extractor: E,
    store: SnapshotStore,
    rules: LabelRules,
    config: CrawlConfig,
    stats: CrawlStats,
}

impl<F, E> Walker<F, E>
where
    F: PageFetcher,
    E: Extractor<Page = F::Page>,
{
    pub fn new(fetcher: F, extractor: E, store: SnapshotStore, config: CrawlConfig) -> Self {
        Self {
            fetcher,
            extractor,
            store,
            rules: LabelRules::default(),
            config,
            stats: CrawlStats::default(),
        }
    }

    /// Runs the full walk, resuming from the persisted snapshot unless
    /// `fresh` is set.
    ///
    /// Only two failures abort the run: the top-level index cannot be
    /// fetched or parsed, or a snapshot persist fails. Everything below
    /// that degrades per-subtree.
    pub async fn run(&mut self, fresh: bool) -> Result<CrawlStats> {
        let mut document = if fresh {
            tracing::info!("Fresh run requested, ignoring any existing snapshot");
            Document::default()
        } else {
            self.store.load()
        };
        tracing::info!(
            "Starting walk at {} ({} sections already persisted)",
            self.config.base_url,
            document.section_count()
        );

        let index = self
            .fetch_page(&self.config.base_url, "part index")
            .await?;
        let part_refs = self.extractor.part_refs(&index)?;
        tracing::info!("Discovered {} parts", part_refs.len());

        for part_ref in &part_refs {
            self.process_part(&mut document, part_ref).await?;
        }

        let stats = self.stats;
        tracing::info!(
            "Walk complete: {} parts processed ({} failed), {} titles ({} abandoned), \
             {} chapters processed ({} skipped, {} failed), {} sections processed \
             ({} fetched, {} carried forward, {} placeholders)",
            stats.parts_processed,
            stats.parts_failed,
            stats.titles_processed,
            stats.titles_abandoned,
            stats.chapters_processed,
            stats.chapters_skipped,
            stats.chapters_failed,
            stats.sections_processed(),
            stats.sections_fetched,
            stats.sections_skipped,
            stats.sections_failed,
        );

        Ok(stats)
    }

    /// Processes one part subtree. Fetch/extract failures skip the part;
    /// only store failures propagate.
    async fn process_part(&mut self, document: &mut Document, part_ref: &PartRef) -> Result<()> {
        let parsed = self.parse_label(&self.rules.part, &part_ref.label);
        self.trace("part", &parsed.id, NodeState::Discovered);

        self.trace("part", &parsed.id, NodeState::Fetching);
        let what = format!("part {} page", parsed.id);
        let page = match self.fetch_page(&part_ref.url, &what).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Skipping part {} after retries: {}", parsed.id, e);
                self.stats.parts_failed += 1;
                self.trace("part", &parsed.id, NodeState::Failed);
                return Ok(());
            }
        };

        self.trace("part", &parsed.id, NodeState::Extracting);
        let title_refs = match self.extractor.title_refs(&page) {
            Ok(refs) => refs,
            Err(e) => {
                tracing::error!("Skipping part {}: {}", parsed.id, e);
                self.stats.parts_failed += 1;
                self.trace("part", &parsed.id, NodeState::Failed);
                return Ok(());
            }
        };

        let part_node = Part {
            part: parsed.id.clone(),
            part_title: parsed.name.clone(),
            url: part_ref.url.clone(),
            titles: Vec::new(),
        };

        self.trace("part", &parsed.id, NodeState::ChildrenPending);
        for title_ref in &title_refs {
            self.process_title(document, &part_node, &page, title_ref)
                .await?;
        }

        self.stats.parts_processed += 1;
        self.trace("part", &parsed.id, NodeState::Done);
        Ok(())
    }

    /// Processes one title subtree. An expansion that never yields
    /// children (after retries) abandons the title: its chapters are not
    /// recorded, and the walk moves on to the next sibling.
    async fn process_title(
        &mut self,
        document: &mut Document,
        part_node: &Part,
        part_page: &F::Page,
        title_ref: &TitleRef,
    ) -> Result<()> {
        let parsed = self.parse_label(&self.rules.title, &title_ref.label);
        self.trace("title", &parsed.id, NodeState::Discovered);

        self.trace("title", &parsed.id, NodeState::Extracting);
        let extractor = &self.extractor;
        let what = format!("expansion of title {}", parsed.id);
        let expansion = run_with_retry(
            &what,
            self.config.max_retries,
            self.config.retry_delay(),
            || extractor.expand_title(part_page, title_ref),
        )
        .await;

        let chapter_refs = match expansion {
            Ok(refs) => refs,
            Err(e) => {
                tracing::warn!(
                    "Abandoning title {} in part {}: {}",
                    parsed.id,
                    part_node.part,
                    e
                );
                self.stats.titles_abandoned += 1;
                self.trace("title", &parsed.id, NodeState::Failed);
                return Ok(());
            }
        };

        let title_node = Title {
            title: parsed.id.clone(),
            title_name: parsed.name.clone(),
            chapters: Vec::new(),
        };

        self.trace("title", &parsed.id, NodeState::ChildrenPending);
        for chapter_ref in &chapter_refs {
            self.process_chapter(document, part_node, &title_node, chapter_ref)
                .await?;
        }

        self.stats.titles_processed += 1;
        self.trace("title", &parsed.id, NodeState::Done);
        Ok(())
    }

    /// Processes one chapter: re-discovers its section links, decides
    /// whether any section body work is owed, fetches the incomplete
    /// sections (with a chapter-scoped second pass over failures), then
    /// merges and persists.
    async fn process_chapter(
        &mut self,
        document: &mut Document,
        part_node: &Part,
        title_node: &Title,
        chapter_ref: &ChapterRef,
    ) -> Result<()> {
        let parsed = self.parse_label(&self.rules.chapter, &chapter_ref.label);
        self.trace("chapter", &parsed.id, NodeState::Discovered);

        self.trace("chapter", &parsed.id, NodeState::Fetching);
        let what = format!("chapter {} page", parsed.id);
        let page = match self.fetch_page(&chapter_ref.url, &what).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Skipping chapter {} after retries: {}", parsed.id, e);
                self.stats.chapters_failed += 1;
                self.trace("chapter", &parsed.id, NodeState::Failed);
                return Ok(());
            }
        };

        self.trace("chapter", &parsed.id, NodeState::Extracting);
        let section_refs = match self.extractor.section_refs(&page) {
            Ok(refs) => refs,
            Err(e) => {
                tracing::warn!("Skipping chapter {}: {}", parsed.id, e);
                self.stats.chapters_failed += 1;
                self.trace("chapter", &parsed.id, NodeState::Failed);
                return Ok(());
            }
        };

        let discovered: Vec<ParsedLabel> = section_refs
            .iter()
            .map(|r| self.parse_label(&self.rules.section, &r.label))
            .collect();

        let persisted = document
            .find_chapter(&part_node.part, &title_node.title, &parsed.id)
            .cloned();

        let discovered_ids: Vec<&str> = discovered.iter().map(|p| p.id.as_str()).collect();
        if !needs_processing(persisted.as_ref(), &discovered_ids) {
            tracing::info!(
                "Chapter {} already satisfied, skipping {} sections",
                parsed.id,
                section_refs.len()
            );
            self.stats.chapters_skipped += 1;
            self.trace("chapter", &parsed.id, NodeState::Done);
            return Ok(());
        }

        let chapter_node = Chapter {
            chapter: parsed.id.clone(),
            chapter_title: parsed.name.clone(),
            url: chapter_ref.url.clone(),
            sections: Vec::new(),
        };

        // Fold new results into the persisted list in place: first-insert
        // order survives, complete sections are never touched again.
        let mut sections: Vec<Section> = persisted.map(|c| c.sections).unwrap_or_default();

        self.trace("chapter", &parsed.id, NodeState::ChildrenPending);
        let mut failed: Vec<(SectionRef, ParsedLabel)> = Vec::new();
        for (section_ref, section_label) in section_refs.iter().zip(&discovered) {
            if let Some(existing) = sections.iter().find(|s| s.section == section_label.id) {
                if existing.is_complete() {
                    self.trace("section", &section_label.id, NodeState::Done);
                    self.stats.sections_skipped += 1;
                    continue;
                }
            }

            match self.fetch_section(section_ref, section_label).await {
                Ok(section) => {
                    self.trace("section", &section_label.id, NodeState::Merged);
                    upsert_section(&mut sections, section);
                    self.stats.sections_fetched += 1;
                }
                Err(e) => {
                    tracing::warn!("Section {} failed, will retry: {}", section_label.id, e);
                    failed.push((section_ref.clone(), section_label.clone()));
                }
            }
        }

        // Chapter-scoped second pass over everything that failed above,
        // before the chapter is considered final.
        for (section_ref, section_label) in &failed {
            match self.fetch_section(section_ref, section_label).await {
                Ok(section) => {
                    upsert_section(&mut sections, section);
                    self.stats.sections_fetched += 1;
                }
                Err(e) => {
                    tracing::error!(
                        "Section {} failed permanently, recording placeholder: {}",
                        section_label.id,
                        e
                    );
                    self.trace("section", &section_label.id, NodeState::Failed);
                    // Keep an existing incomplete entry as is; otherwise
                    // record the section with empty text so it still
                    // appears in the output and stays eligible for the
                    // next run.
                    if !sections.iter().any(|s| s.section == section_label.id) {
                        sections.push(Section {
                            section: section_label.id.clone(),
                            section_title: section_label.name.clone(),
                            full_text: String::new(),
                            url: section_ref.url.clone(),
                        });
                    }
                    self.stats.sections_failed += 1;
                }
            }
        }

        merge(document, part_node, title_node, &chapter_node, sections);
        self.trace("chapter", &parsed.id, NodeState::Merged);
        self.store.persist(document)?;

        self.stats.chapters_processed += 1;
        self.trace("chapter", &parsed.id, NodeState::Done);
        Ok(())
    }

    /// Fetches and extracts one section body as a single retried unit.
    async fn fetch_section(
        &self,
        section_ref: &SectionRef,
        label: &ParsedLabel,
    ) -> Result<Section> {
        self.trace("section", &label.id, NodeState::Fetching);
        let fetcher = &self.fetcher;
        let extractor = &self.extractor;
        let timeout = self.config.step_timeout();
        let url = section_ref.url.as_str();
        let what = format!("section {}", label.id);

        let body = run_with_retry(
            &what,
            self.config.max_retries,
            self.config.retry_delay(),
            || async move {
                let page = fetcher.fetch(url, timeout).await?;
                Ok::<_, LoomError>(extractor.section_body(&page)?)
            },
        )
        .await?;

        tokio::time::sleep(self.config.pace_delay()).await;

        let section_title = if label.name.is_empty() {
            body.heading.unwrap_or_default()
        } else {
            label.name.clone()
        };

        Ok(Section {
            section: label.id.clone(),
            section_title,
            full_text: body.text,
            url: section_ref.url.clone(),
        })
    }

    /// Fetches one page with retry, then applies the pacing delay.
    async fn fetch_page(&self, url: &str, what: &str) -> Result<F::Page> {
        let fetcher = &self.fetcher;
        let timeout = self.config.step_timeout();

        let page = run_with_retry(
            what,
            self.config.max_retries,
            self.config.retry_delay(),
            || fetcher.fetch(url, timeout),
        )
        .await?;

        tokio::time::sleep(self.config.pace_delay()).await;
        Ok(page)
    }

    fn parse_label(&self, pattern: &LabelPattern, raw: &str) -> ParsedLabel {
        let parsed = pattern.parse(raw);
        if parsed.fallback {
            tracing::debug!(
                "Label pattern missed, positional fallback used for '{}'",
                raw.trim()
            );
        }
        parsed
    }

    fn trace(&self, level: &str, key: &str, state: NodeState) {
        tracing::debug!("{} {}: {}", level, key, state);
    }
}

/// Decides whether a chapter's sections owe any work this run.
///
/// True when the chapter is absent from the persisted document, has no
/// persisted sections, or any discovered section id is absent or
/// incomplete in the persisted chapter. False means the chapter is
/// satisfied and its section pages are not fetched at all.
pub fn needs_processing(persisted: Option<&Chapter>, discovered_ids: &[&str]) -> bool {
    let chapter = match persisted {
        None => return true,
        Some(c) => c,
    };

    if chapter.sections.is_empty() {
        return true;
    }

    discovered_ids.iter().any(|id| {
        match chapter.sections.iter().find(|s| s.section == *id) {
            None => true,
            Some(section) => !section.is_complete(),
        }
    })
}

fn upsert_section(sections: &mut Vec<Section>, section: Section) {
    match sections.iter_mut().find(|s| s.section == section.section) {
        Some(existing) => *existing = section,
        None => sections.push(section),
    }
}

/// Runs a full crawl with the shipped HTTP fetcher and HTML extractor.
pub async fn crawl(config: Config, fresh: bool) -> Result<CrawlStats> {
    let fetcher = HttpFetcher::new(&config.user_agent)?;
    let extractor = HtmlExtractor::new(fetcher.client().clone(), config.crawl.step_timeout());
    let store = SnapshotStore::new(&config.output.snapshot_path);

    let mut walker = Walker::new(fetcher, extractor, store, config.crawl);
    walker.run(fresh).await
}
