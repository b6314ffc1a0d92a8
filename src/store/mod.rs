//! Incremental snapshot store
//!
//! The whole document is persisted after every completed chapter, so an
//! interrupted run loses at most the in-flight chapter and the next run
//! resumes from everything already merged. Loads recover: a missing or
//! unreadable snapshot yields an empty document and a warning, never a
//! crash. Writes are the opposite: a failed persist is fatal, because
//! continuing would silently lose progress.

use crate::document::{Chapter, Document, Part, Section, Title};
use crate::StoreError;
use std::path::PathBuf;

/// File-backed store for the snapshot document
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the persisted document, or an empty one when no usable
    /// snapshot exists.
    pub fn load(&self) -> Document {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No snapshot at {}, starting fresh", self.path.display());
                return Document::default();
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read snapshot {}: {}; starting from an empty document",
                    self.path.display(),
                    e
                );
                return Document::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(
                    "Failed to parse snapshot {}: {}; starting from an empty document",
                    self.path.display(),
                    e
                );
                Document::default()
            }
        }
    }

    /// Serializes the whole document and atomically replaces the snapshot
    /// (write to a temp file in the same directory, then rename).
    pub fn persist(&self, document: &Document) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(document)?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(
            "Persisted snapshot ({} sections) to {}",
            document.section_count(),
            self.path.display()
        );
        Ok(())
    }
}

/// Folds one processed chapter subtree into the document.
///
/// Locates or creates the Part, Title, and Chapter by key; creation copies
/// the freshly discovered payload, insertion order follows discovery
/// order. An existing chapter has its section list **replaced** with
/// `sections`; the walker has already folded skipped and prior sections
/// into that list, so replacing keeps everything previously worth keeping.
pub fn merge(
    document: &mut Document,
    part: &Part,
    title: &Title,
    chapter: &Chapter,
    sections: Vec<Section>,
) {
    let part_idx = match document.parts.iter().position(|p| p.part == part.part) {
        Some(i) => i,
        None => {
            document.parts.push(Part {
                part: part.part.clone(),
                part_title: part.part_title.clone(),
                url: part.url.clone(),
                titles: Vec::new(),
            });
            document.parts.len() - 1
        }
    };
    let part_entry = &mut document.parts[part_idx];

    let title_idx = match part_entry.titles.iter().position(|t| t.title == title.title) {
        Some(i) => i,
        None => {
            part_entry.titles.push(Title {
                title: title.title.clone(),
                title_name: title.title_name.clone(),
                chapters: Vec::new(),
            });
            part_entry.titles.len() - 1
        }
    };
    let title_entry = &mut part_entry.titles[title_idx];

    match title_entry
        .chapters
        .iter_mut()
        .find(|c| c.chapter == chapter.chapter)
    {
        Some(existing) => {
            existing.sections = sections;
        }
        None => {
            title_entry.chapters.push(Chapter {
                chapter: chapter.chapter.clone(),
                chapter_title: chapter.chapter_title.clone(),
                url: chapter.url.clone(),
                sections,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn part(id: &str) -> Part {
        Part {
            part: id.to_string(),
            part_title: format!("Part {}", id),
            url: format!("https://law.example.gov/parts/{}", id),
            titles: Vec::new(),
        }
    }

    fn title(id: &str) -> Title {
        Title {
            title: id.to_string(),
            title_name: format!("Title {}", id),
            chapters: Vec::new(),
        }
    }

    fn chapter(id: &str) -> Chapter {
        Chapter {
            chapter: id.to_string(),
            chapter_title: format!("Chapter {}", id),
            url: format!("https://law.example.gov/chapters/{}", id),
            sections: Vec::new(),
        }
    }

    fn section(id: &str, text: &str) -> Section {
        Section {
            section: id.to_string(),
            section_title: format!("§ {}.", id),
            full_text: text.to_string(),
            url: format!("https://law.example.gov/sections/{}", id),
        }
    }

    #[test]
    fn test_load_missing_snapshot_is_empty() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("missing.json"));
        assert_eq!(store.load(), Document::default());
    }

    #[test]
    fn test_load_corrupt_snapshot_recovers_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = SnapshotStore::new(&path);
        assert_eq!(store.load(), Document::default());
    }

    #[test]
    fn test_persist_then_load_roundtrip() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("snapshot.json"));

        let mut document = Document::default();
        merge(
            &mut document,
            &part("I"),
            &title("II"),
            &chapter("3A"),
            vec![section("3A-101", "Some text.")],
        );

        store.persist(&document).unwrap();
        assert_eq!(store.load(), document);
    }

    #[test]
    fn test_persist_overwrites_prior_snapshot() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("snapshot.json"));

        let mut first = Document::default();
        merge(&mut first, &part("I"), &title("I"), &chapter("1"), vec![]);
        store.persist(&first).unwrap();

        let mut second = first.clone();
        merge(
            &mut second,
            &part("I"),
            &title("I"),
            &chapter("2"),
            vec![section("2-101", "text")],
        );
        store.persist(&second).unwrap();

        assert_eq!(store.load(), second);
    }

    #[test]
    fn test_merge_creates_full_path() {
        let mut document = Document::default();
        merge(
            &mut document,
            &part("I"),
            &title("IV"),
            &chapter("7"),
            vec![section("7-101", "text")],
        );

        let chapter = document.find_chapter("I", "IV", "7").unwrap();
        assert_eq!(chapter.sections.len(), 1);
        assert_eq!(document.parts.len(), 1);
        assert_eq!(document.parts[0].titles.len(), 1);
    }

    #[test]
    fn test_merge_by_key_no_duplicates() {
        let mut document = Document::default();
        merge(
            &mut document,
            &part("I"),
            &title("I"),
            &chapter("1"),
            vec![section("1-101", "old")],
        );

        // Re-crawl reports the same part/title/chapter plus one new section;
        // the walker hands merge the folded union list
        merge(
            &mut document,
            &part("I"),
            &title("I"),
            &chapter("1"),
            vec![section("1-101", "old"), section("1-102", "new")],
        );

        assert_eq!(document.parts.len(), 1);
        assert_eq!(document.parts[0].titles.len(), 1);
        assert_eq!(document.parts[0].titles[0].chapters.len(), 1);
        let sections = &document.parts[0].titles[0].chapters[0].sections;
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].section, "1-101");
        assert_eq!(sections[1].section, "1-102");
    }

    #[test]
    fn test_merge_replaces_sections_not_appends() {
        let mut document = Document::default();
        merge(
            &mut document,
            &part("I"),
            &title("I"),
            &chapter("1"),
            vec![section("1-101", "first pass")],
        );
        merge(
            &mut document,
            &part("I"),
            &title("I"),
            &chapter("1"),
            vec![section("1-101", "second pass")],
        );

        let sections = &document.parts[0].titles[0].chapters[0].sections;
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].full_text, "second pass");
    }

    #[test]
    fn test_merge_preserves_sibling_order() {
        let mut document = Document::default();
        merge(&mut document, &part("I"), &title("I"), &chapter("2"), vec![]);
        merge(&mut document, &part("I"), &title("I"), &chapter("1"), vec![]);
        merge(&mut document, &part("II"), &title("I"), &chapter("9"), vec![]);

        let chapters: Vec<&str> = document.parts[0].titles[0]
            .chapters
            .iter()
            .map(|c| c.chapter.as_str())
            .collect();
        // Discovery order kept, never re-sorted
        assert_eq!(chapters, vec!["2", "1"]);
        assert_eq!(document.parts[1].part, "II");
    }

    #[test]
    fn test_merge_does_not_refresh_existing_payload() {
        let mut document = Document::default();
        merge(&mut document, &part("I"), &title("I"), &chapter("1"), vec![]);

        let mut renamed = part("I");
        renamed.part_title = "Renamed Part".to_string();
        merge(&mut document, &renamed, &title("I"), &chapter("1"), vec![]);

        // Existing nodes keep their first-discovered payload
        assert_eq!(document.parts[0].part_title, "Part I");
    }
}
