//! Appends verified source links to a synthesis document.
//!
//! The model writes the `## PROVENANCE` bullets (title, authors,
//! publication) without URLs; the links the app actually fetched are added
//! here. Pure string transform.

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

lazy_static! {
    static ref PROVENANCE_HEADING: Regex = Regex::new(r"(?i)^\s*##\s*provenance\s*:?\s*$").unwrap();
}

/// Links known to be good for a run, in precedence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvenanceLinks {
    pub source1: Option<String>,
    pub source2: Option<String>,
    pub thread: Option<String>,
}

impl ProvenanceLinks {
    /// Normalized, deduplicated links: source 1, source 2, then thread.
    pub fn ordered(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for link in [&self.source1, &self.source2, &self.thread]
            .into_iter()
            .flatten()
        {
            let normalized = normalize_link(link);
            if !normalized.is_empty() && !out.contains(&normalized) {
                out.push(normalized);
            }
        }
        out
    }
}

/// Canonicalize a link and trim a single trailing slash.
pub fn normalize_link(link: &str) -> String {
    let trimmed = link.trim();
    let canonical = match Url::parse(trimmed) {
        Ok(url) => url.to_string(),
        Err(_) => trimmed.to_string(),
    };
    match canonical.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => canonical,
    }
}

/// Whether a line is the provenance heading.
pub fn is_provenance_heading(line: &str) -> bool {
    PROVENANCE_HEADING.is_match(line)
}

/// Insert link bullets at the end of the `## PROVENANCE` section, or append
/// a new section when the text has none.
pub fn append_provenance(text: &str, links: &ProvenanceLinks) -> String {
    let links = links.ordered();
    if links.is_empty() {
        return text.to_string();
    }
    let bullets: Vec<String> = links.iter().map(|l| format!("- {}", l)).collect();

    let mut lines: Vec<&str> = text.split('\n').collect();
    let Some(heading) = lines.iter().position(|l| is_provenance_heading(l)) else {
        let separator = if text.is_empty() || text.ends_with("\n\n") {
            ""
        } else if text.ends_with('\n') {
            "\n"
        } else {
            "\n\n"
        };
        return format!("{}{}## PROVENANCE\n{}", text, separator, bullets.join("\n"));
    };

    let next_heading = lines
        .iter()
        .enumerate()
        .skip(heading + 1)
        .find(|(_, l)| l.trim_start().starts_with("##"))
        .map(|(i, _)| i);

    let insert_at = match next_heading {
        Some(i) => i,
        // Keep a final newline after the inserted bullets.
        None if text.ends_with('\n') => lines.len() - 1,
        None => lines.len(),
    };

    let mut insertion: Vec<&str> = Vec::with_capacity(bullets.len() + 2);
    if !lines[insert_at - 1].trim().is_empty() {
        insertion.push("");
    }
    insertion.extend(bullets.iter().map(String::as_str));
    if next_heading.is_some() {
        insertion.push("");
    }

    lines.splice(insert_at..insert_at, insertion);
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(a: Option<&str>, b: Option<&str>, t: Option<&str>) -> ProvenanceLinks {
        ProvenanceLinks {
            source1: a.map(String::from),
            source2: b.map(String::from),
            thread: t.map(String::from),
        }
    }

    #[test]
    fn test_normalize_trims_single_trailing_slash() {
        assert_eq!(normalize_link(" https://Example.com/ "), "https://example.com");
        assert_eq!(normalize_link("https://example.com/a/"), "https://example.com/a");
        assert_eq!(normalize_link("not a url/"), "not a url");
    }

    #[test]
    fn test_ordered_dedups_with_precedence() {
        let l = links(
            Some("https://a.io/post/"),
            Some("https://news.ycombinator.com/item?id=1"),
            Some("https://news.ycombinator.com/item?id=1"),
        );
        assert_eq!(
            l.ordered(),
            vec!["https://a.io/post", "https://news.ycombinator.com/item?id=1"]
        );

        let l = links(Some("https://a.io"), Some("https://a.io/"), None);
        assert_eq!(l.ordered(), vec!["https://a.io"]);
    }

    #[test]
    fn test_no_links_returns_input() {
        let text = "# Title\n\n## PROVENANCE\n- Article";
        assert_eq!(append_provenance(text, &ProvenanceLinks::default()), text);
        assert_eq!(append_provenance(text, &links(Some("  "), None, None)), text);
    }

    #[test]
    fn test_appends_section_when_missing() {
        let text = "# Title\n\n## TOPIC FOLLOWS: A\n• one";
        let out = append_provenance(text, &links(Some("https://a.io/x"), None, None));

        assert!(out.starts_with(text));
        assert_eq!(out, format!("{}\n\n## PROVENANCE\n- https://a.io/x", text));
    }

    #[test]
    fn test_appended_section_respects_trailing_newline() {
        let text = "# Title\n";
        let out = append_provenance(text, &links(Some("https://a.io"), None, None));
        assert_eq!(out, "# Title\n\n## PROVENANCE\n- https://a.io");
    }

    #[test]
    fn test_inserts_at_end_of_existing_section() {
        let text = "# T\n## PROVENANCE\n- Article Title\n- Author";
        let out = append_provenance(text, &links(Some("https://a.io"), Some("https://b.io"), None));

        assert_eq!(
            out,
            "# T\n## PROVENANCE\n- Article Title\n- Author\n\n- https://a.io\n- https://b.io"
        );
    }

    #[test]
    fn test_inserts_before_following_heading() {
        let text = "## provenance\n- Article\n## MISC Topics\n• misc";
        let out = append_provenance(text, &links(Some("https://a.io"), None, None));

        assert_eq!(out, "## provenance\n- Article\n\n- https://a.io\n\n## MISC Topics\n• misc");
        let link = out.find("https://a.io").unwrap();
        assert!(link < out.find("## MISC").unwrap());
        assert!(link > out.find("- Article").unwrap());
    }

    #[test]
    fn test_no_extra_separator_after_blank_line() {
        let text = "##   PROVENANCE  \n- Article\n\n";
        let out = append_provenance(text, &links(Some("https://a.io"), None, None));
        assert_eq!(out, "##   PROVENANCE  \n- Article\n\n- https://a.io\n");
    }

    #[test]
    fn test_heading_matching_is_strict_about_the_word() {
        assert!(is_provenance_heading("## PROVENANCE"));
        assert!(is_provenance_heading("##Provenance:"));
        assert!(!is_provenance_heading("## PROVENANCE NOTES"));
        assert!(!is_provenance_heading("# PROVENANCE"));
    }
}
