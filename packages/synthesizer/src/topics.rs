//! Parser for the synthesis markdown dialect.
//!
//! Models drift between a few spellings of the topic marker. Each accepted
//! spelling has its own recognizer, and all of them produce the same
//! [`LineKind::TopicStart`] so nothing downstream cares which one matched.

use lazy_static::lazy_static;
use regex::Regex;

use crate::provenance::is_provenance_heading;

lazy_static! {
    // `## TOPIC FOLLOWS: Title`, any number of hashes, colon optional
    static ref HASHES_FIRST: Regex =
        Regex::new(r"(?i)^#+\s*TOPIC\s+FOLLOWS\b\s*:?\s*(.*)$").unwrap();
    // `TOPIC FOLLOWS ## Title`
    static ref MARKER_FIRST: Regex =
        Regex::new(r"(?i)^TOPIC\s+FOLLOWS\b\s*:?\s*#+\s*(.*)$").unwrap();
    // `TOPIC FOLLOWS: Title`
    static ref BARE: Regex = Regex::new(r"(?i)^TOPIC\s+FOLLOWS\b\s*:\s*(.*)$").unwrap();
    static ref ATTRIBUTION: Regex =
        Regex::new(r"(?i)^\*{0,2}(According to [^:]{1,120}:)\*{0,2}\s*(.*)$").unwrap();
    static ref RULE: Regex = Regex::new(r"^([-*_])(\s*[-*_]){2,}$").unwrap();
}

/// The accepted spellings of a topic marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicMarker {
    HashesFirst,
    MarkerFirst,
    Bare,
}

impl TopicMarker {
    const ALL: [TopicMarker; 3] = [Self::HashesFirst, Self::MarkerFirst, Self::Bare];

    fn pattern(self) -> &'static Regex {
        match self {
            Self::HashesFirst => &HASHES_FIRST,
            Self::MarkerFirst => &MARKER_FIRST,
            Self::Bare => &BARE,
        }
    }

    /// Title when `line` is this spelling of the marker.
    pub fn recognize(self, line: &str) -> Option<String> {
        self.pattern()
            .captures(line)
            .map(|caps| caps[1].trim().trim_end_matches('#').trim().to_string())
    }
}

/// Classification of a single trimmed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    TopicStart(String),
    Headline(String),
    ProvenanceHeading,
    Heading,
    Bullet(String),
    Other,
}

pub fn classify_line(line: &str) -> LineKind {
    let trimmed = line.trim();

    if let Some(title) = TopicMarker::ALL
        .iter()
        .find_map(|marker| marker.recognize(trimmed))
    {
        return LineKind::TopicStart(title);
    }
    if is_provenance_heading(trimmed) {
        return LineKind::ProvenanceHeading;
    }
    if let Some(rest) = trimmed.strip_prefix("# ") {
        return LineKind::Headline(rest.trim().to_string());
    }
    if trimmed.starts_with('#') {
        return LineKind::Heading;
    }
    if RULE.is_match(trimmed) {
        return LineKind::Other;
    }
    match strip_bullet(trimmed) {
        Some(text) => LineKind::Bullet(text.to_string()),
        None => LineKind::Other,
    }
}

/// Text of a bullet line without its marker, or `None` if not a bullet.
pub fn strip_bullet(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let rest = trimmed
        .strip_prefix('•')
        .or_else(|| trimmed.strip_prefix('*'))
        .or_else(|| trimmed.strip_prefix('-'))?;
    Some(rest.trim())
}

/// A titled group of bullets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub title: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSynthesis {
    pub headline: Option<String>,
    pub topics: Vec<Topic>,
    /// Raw bullet lines of the provenance section.
    pub provenance: Vec<String>,
}

impl ParsedSynthesis {
    /// All topic bullets in document order.
    pub fn bullets(&self) -> impl Iterator<Item = &str> {
        self.topics
            .iter()
            .flat_map(|t| t.bullets.iter().map(String::as_str))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Topic,
    Provenance,
}

pub fn parse_synthesis(text: &str) -> ParsedSynthesis {
    let mut parsed = ParsedSynthesis::default();
    let mut section = Section::None;

    for line in text.lines() {
        match classify_line(line) {
            LineKind::TopicStart(title) => {
                let title = if title.is_empty() {
                    format!("Topic {}", parsed.topics.len() + 1)
                } else {
                    title
                };
                parsed.topics.push(Topic {
                    title,
                    bullets: Vec::new(),
                });
                section = Section::Topic;
            }
            LineKind::ProvenanceHeading => section = Section::Provenance,
            LineKind::Headline(text) => {
                if parsed.headline.is_none() && !text.is_empty() {
                    parsed.headline = Some(text);
                }
                section = Section::None;
            }
            LineKind::Heading => section = Section::None,
            LineKind::Bullet(text) => match section {
                Section::Topic if !text.is_empty() => {
                    if let Some(topic) = parsed.topics.last_mut() {
                        topic.bullets.push(text);
                    }
                }
                Section::Provenance => parsed.provenance.push(line.trim().to_string()),
                _ => {}
            },
            LineKind::Other => {}
        }
    }

    parsed
}

/// Bullet lines of the provenance section, as written.
pub fn extract_provenance(text: &str) -> Vec<String> {
    parse_synthesis(text).provenance
}

/// Bullet texts of a plain bullet list such as a summary.
pub fn bullet_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(strip_bullet)
        .filter(|b| !b.is_empty())
        .map(String::from)
        .collect()
}

/// Split a leading `According to ...:` clause off a bullet.
pub fn split_attribution(bullet: &str) -> (Option<&str>, &str) {
    match ATTRIBUTION.captures(bullet.trim()) {
        Some(caps) => {
            let clause = caps.get(1).map(|m| m.as_str());
            let rest = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            (clause, rest)
        }
        None => (None, bullet.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(title: &str, bullets: &[&str]) -> Topic {
        Topic {
            title: title.to_string(),
            bullets: bullets.iter().map(|b| b.to_string()).collect(),
        }
    }

    #[test]
    fn test_two_canonical_topics() {
        let parsed = parse_synthesis("## TOPIC FOLLOWS: A\n• one\n• two\n## TOPIC FOLLOWS: B\n- three");

        assert_eq!(
            parsed.topics,
            vec![topic("A", &["one", "two"]), topic("B", &["three"])]
        );
        assert!(parsed.provenance.is_empty());
    }

    #[test]
    fn test_all_marker_spellings_normalize() {
        for line in [
            "## TOPIC FOLLOWS: Rust",
            "### TOPIC FOLLOWS Rust",
            "TOPIC FOLLOWS ## Rust",
            "TOPIC FOLLOWS: ## Rust",
            "TOPIC FOLLOWS: Rust",
            "  ## topic follows: Rust  ",
        ] {
            assert_eq!(classify_line(line), LineKind::TopicStart("Rust".into()), "{line}");
        }
    }

    #[test]
    fn test_other_heading_closes_topic() {
        let text = "# Headline\n## TOPIC FOLLOWS: A\n• kept\n## MISC Topics\n• dropped\n## TOPIC FOLLOWS: B\n* b1";
        let parsed = parse_synthesis(text);

        assert_eq!(parsed.headline.as_deref(), Some("Headline"));
        assert_eq!(parsed.topics, vec![topic("A", &["kept"]), topic("B", &["b1"])]);
    }

    #[test]
    fn test_marker_must_end_at_word_boundary() {
        for line in ["## TOPIC FOLLOWSHIP notes", "TOPIC FOLLOWSHIP ## notes", "TOPIC FOLLOWSHIP: notes"] {
            assert!(TopicMarker::ALL.iter().all(|m| m.recognize(line).is_none()), "{line}");
        }

        let parsed = parse_synthesis("## TOPIC FOLLOWS: A\n• kept\n## TOPIC FOLLOWSHIP notes\n• dropped");
        assert_eq!(parsed.topics, vec![topic("A", &["kept"])]);
    }

    #[test]
    fn test_provenance_collected_until_next_heading() {
        let text = "## TOPIC FOLLOWS: A\n• a\n## PROVENANCE\n- Title: X\n- Author: Y\n\n- https://x.io\n## After\n- ignored";
        let parsed = parse_synthesis(text);

        assert_eq!(parsed.topics, vec![topic("A", &["a"])]);
        assert_eq!(
            parsed.provenance,
            vec!["- Title: X", "- Author: Y", "- https://x.io"]
        );
        assert_eq!(extract_provenance(text), parsed.provenance);
    }

    #[test]
    fn test_empty_bullets_and_rules_ignored() {
        let parsed = parse_synthesis("## TOPIC FOLLOWS: A\n•\n- \n---\n• real\nplain prose");
        assert_eq!(parsed.topics, vec![topic("A", &["real"])]);
    }

    #[test]
    fn test_bullets_before_any_topic_ignored() {
        let parsed = parse_synthesis("• orphan\n## TOPIC FOLLOWS:\n• x");
        assert_eq!(parsed.topics, vec![topic("Topic 1", &["x"])]);
    }

    #[test]
    fn test_split_attribution() {
        assert_eq!(
            split_attribution("According to the Article: Rust is fast"),
            (Some("According to the Article:"), "Rust is fast")
        );
        assert_eq!(
            split_attribution("**According to Hacker News User pg:** agreed"),
            (Some("According to Hacker News User pg:"), "agreed")
        );
        assert_eq!(split_attribution("No clause here"), (None, "No clause here"));
    }

    #[test]
    fn test_bullet_lines() {
        assert_eq!(
            bullet_lines("• The overall main point is X\n\n- second\nprose"),
            vec!["The overall main point is X", "second"]
        );
    }
}
