//! Document model for the reconstructed legal code
//!
//! Four levels, each node with a stable key and a payload:
//! Part (roman id) → Title (roman id) → Chapter (alphanumeric id) →
//! Section (leaf, with full text). The serde field names below are the
//! persisted snapshot layout; the snapshot is both the final artifact and
//! the resume checkpoint, so this shape never diverges between roles.

use serde::{Deserialize, Serialize};

/// The whole reconstructed code. A pure aggregation: it owns all
/// descendants, and no node is shared across parents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// Roman-numeral id, unique among parts
    pub part: String,
    pub part_title: String,
    pub url: String,
    #[serde(default)]
    pub titles: Vec<Title>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    /// Roman-numeral id, scoped to the parent part
    pub title: String,
    pub title_name: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Alphanumeric id, scoped to the parent title
    pub chapter: String,
    pub chapter_title: String,
    pub url: String,
    /// Older snapshots may omit this field entirely; that deserializes to
    /// an empty list, which the needs-processing gate treats the same way.
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Numeric/alphanumeric id, scoped to the parent chapter
    pub section: String,
    pub section_title: String,
    pub full_text: String,
    pub url: String,
}

impl Document {
    pub fn find_part(&self, key: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.part == key)
    }

    /// Looks up a persisted chapter by its full key path.
    pub fn find_chapter(&self, part: &str, title: &str, chapter: &str) -> Option<&Chapter> {
        self.find_part(part)?
            .titles
            .iter()
            .find(|t| t.title == title)?
            .chapters
            .iter()
            .find(|c| c.chapter == chapter)
    }

    pub fn section_count(&self) -> usize {
        self.parts
            .iter()
            .flat_map(|p| &p.titles)
            .flat_map(|t| &t.chapters)
            .map(|c| c.sections.len())
            .sum()
    }
}

impl Section {
    /// A section is complete when its full text is non-empty, or its title
    /// marks a terminal administrative state ("Repealed"/"Inoperative") in
    /// which case no body text will ever exist. Incomplete sections remain
    /// eligible for refetching on every future run.
    pub fn is_complete(&self) -> bool {
        if !self.full_text.trim().is_empty() {
            return true;
        }
        has_terminal_title(&self.section_title)
    }
}

/// Case-insensitive check for a terminal administrative state prefix.
pub fn has_terminal_title(title: &str) -> bool {
    let t = title.trim();
    starts_with_ignore_case(t, "repealed") || starts_with_ignore_case(t, "inoperative")
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix)
}
