//! Crawl statistics
//!
//! Counters accumulated by the walker during a run, plus a snapshot
//! summarizer for the --stats mode.

use crate::document::Document;

/// Counters for one crawl run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Parts whose subtree was walked
    pub parts_processed: u64,
    /// Parts skipped after their page could not be fetched
    pub parts_failed: u64,

    /// Titles whose chapters were walked
    pub titles_processed: u64,
    /// Titles abandoned after their expansion never yielded children
    pub titles_abandoned: u64,

    /// Chapters whose sections were visited
    pub chapters_processed: u64,
    /// Chapters skipped because every discoverable section was complete
    pub chapters_skipped: u64,
    /// Chapters dropped after their page could not be fetched or read
    pub chapters_failed: u64,

    /// Section bodies fetched this run
    pub sections_fetched: u64,
    /// Sections carried forward from the snapshot without a fetch
    pub sections_skipped: u64,
    /// Sections recorded with an empty placeholder after retries
    pub sections_failed: u64,
}

impl CrawlStats {
    pub fn sections_processed(&self) -> u64 {
        self.sections_fetched + self.sections_skipped
    }
}

/// Per-level counts of a persisted snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub parts: usize,
    pub titles: usize,
    pub chapters: usize,
    pub sections: usize,
    pub complete_sections: usize,
}

/// Summarizes a loaded snapshot document
pub fn summarize(document: &Document) -> SnapshotSummary {
    let mut summary = SnapshotSummary {
        parts: document.parts.len(),
        ..Default::default()
    };

    for part in &document.parts {
        summary.titles += part.titles.len();
        for title in &part.titles {
            summary.chapters += title.chapters.len();
            for chapter in &title.chapters {
                summary.sections += chapter.sections.len();
                summary.complete_sections += chapter
                    .sections
                    .iter()
                    .filter(|s| s.is_complete())
                    .count();
            }
        }
    }

    summary
}

/// Prints a snapshot summary to stdout
pub fn print_summary(summary: &SnapshotSummary) {
    println!("=== Snapshot Summary ===\n");
    println!("  Parts:    {}", summary.parts);
    println!("  Titles:   {}", summary.titles);
    println!("  Chapters: {}", summary.chapters);
    println!("  Sections: {}", summary.sections);

    let completion = if summary.sections > 0 {
        (summary.complete_sections as f64 / summary.sections as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "\nCompletion: {:.1}% ({} / {} sections complete)",
        completion, summary.complete_sections, summary.sections
    );
}
