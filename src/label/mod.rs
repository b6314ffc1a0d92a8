//! Declarative label parsing
//!
//! Every structural level of the source site carries a raw label string
//! ("Part I General Provisions Chapters. 1-24", "Title IV Public Health",
//! "Chapter 3A Boards and Commissions", "§ 1-101. Definitions."). One
//! parser handles all of them: a level-specific pattern with named `id` and
//! `name` captures, degrading to a positional fallback when the pattern
//! does not match. Parsing never fails; a fallback parse is recorded on the
//! result so the walker can log it.

use regex::Regex;

/// Result of parsing a raw label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLabel {
    pub id: String,
    pub name: String,
    /// True when the positional fallback fired instead of the pattern
    pub fallback: bool,
}

/// A level-specific label pattern plus its positional fallback rule
#[derive(Debug, Clone)]
pub struct LabelPattern {
    /// Level keyword the fallback strips when it leads the label
    keyword: &'static str,
    regex: Regex,
}

impl LabelPattern {
    fn new(keyword: &'static str, pattern: &str) -> Self {
        // Patterns are compile-time constants; a failure here is a bug in
        // this module, not a runtime condition.
        let regex = Regex::new(pattern).expect("static label pattern");
        Self { keyword, regex }
    }

    /// Parses a raw label into id and name.
    ///
    /// When the level pattern matches, the named captures win. Otherwise
    /// the positional fallback applies: trim, split on whitespace, drop a
    /// leading level keyword, take the first remaining token as the id and
    /// the rest as the name.
    pub fn parse(&self, raw: &str) -> ParsedLabel {
        if let Some(caps) = self.regex.captures(raw) {
            if let (Some(id), Some(name)) = (caps.name("id"), caps.name("name")) {
                return ParsedLabel {
                    id: id.as_str().to_string(),
                    name: name.as_str().trim().to_string(),
                    fallback: false,
                };
            }
        }

        self.fallback(raw)
    }

    fn fallback(&self, raw: &str) -> ParsedLabel {
        let mut tokens = raw.split_whitespace().peekable();

        if let Some(first) = tokens.peek() {
            if first.eq_ignore_ascii_case(self.keyword) {
                tokens.next();
            }
        }

        let id = tokens.next().unwrap_or_default().to_string();
        let name = tokens.collect::<Vec<_>>().join(" ");

        ParsedLabel {
            id,
            name,
            fallback: true,
        }
    }
}

/// The label patterns for all four levels
#[derive(Debug, Clone)]
pub struct LabelRules {
    pub part: LabelPattern,
    pub title: LabelPattern,
    pub chapter: LabelPattern,
    pub section: LabelPattern,
}

impl Default for LabelRules {
    fn default() -> Self {
        Self {
            // "Part I General Provisions Chapters. 1-24"
            part: LabelPattern::new(
                "part",
                r"(?i)^\s*Part\s+(?P<id>[IVXLCDM]+)\s+(?P<name>.+?)\s+Chapters\.\s+\S.*$",
            ),
            // "Title IV Public Health"
            title: LabelPattern::new(
                "title",
                r"(?i)^\s*Title\s+(?P<id>[IVXLCDM]+)\s+(?P<name>\S.*)$",
            ),
            // "Chapter 3A Boards and Commissions"
            chapter: LabelPattern::new(
                "chapter",
                r"(?i)^\s*Chapter\s+(?P<id>[0-9A-Za-z][0-9A-Za-z.\-]*)\s+(?P<name>\S.*)$",
            ),
            // "§ 1-101. Definitions." (the marks and trailing period vary)
            section: LabelPattern::new(
                "section",
                r"^\s*(?:§+\s*)?(?P<id>\d[0-9A-Za-z.\-]*?)\.?\s+(?P<name>\S.*)$",
            ),
        }
    }
}
