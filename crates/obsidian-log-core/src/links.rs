//! Link references inside a single line of markdown.
//!
//! Two shapes are recognised: markdown links whose target is empty or
//! `http(s)`, and bare `http(s)://` URLs.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[(?P<text>[^\]\n]*)\]\((?P<url>(?:https?://[^)\s]*)?)\)|(?P<bare>https?://[^\s<>()\[\]]+)",
    )
    .expect("link regex should compile")
});

/// A hyperlink extracted from a line of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkSpan {
    pub display_text: String,
    pub target_url: String,
}

/// Whether the trimmed line consists of link references and whitespace only.
pub fn is_link_only(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || !LINK_REGEX.is_match(trimmed) {
        return false;
    }
    LINK_REGEX.replace_all(trimmed, "").trim().is_empty()
}

/// Extract the usable links of a line, in order of appearance.
///
/// References whose target doesn't parse as an absolute URL with a host are
/// skipped. Markdown links with empty text display their URL.
pub fn extract_links(line: &str) -> Vec<LinkSpan> {
    LINK_REGEX
        .captures_iter(line)
        .filter_map(|caps| {
            let (text, target) = match caps.name("bare") {
                Some(bare) => (bare.as_str(), bare.as_str()),
                None => (
                    caps.name("text").map_or("", |m| m.as_str()),
                    caps.name("url").map_or("", |m| m.as_str()),
                ),
            };

            let parsed = url::Url::parse(target).ok()?;
            parsed.host_str().filter(|h| !h.is_empty())?;

            let text = text.trim();
            Some(LinkSpan {
                display_text: if text.is_empty() { target } else { text }.to_string(),
                target_url: target.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_only_bare_url() {
        assert!(is_link_only("https://example.com"));
        assert!(is_link_only("  https://example.com/path?q=1  "));
        assert!(is_link_only("https://a.com https://b.com"));
    }

    #[test]
    fn test_link_only_markdown_link() {
        assert!(is_link_only("[Example](https://example.com)"));
        assert!(is_link_only("[A](https://a.com) [B](https://b.com)"));
        assert!(is_link_only("[broken]()"));
    }

    #[test]
    fn test_not_link_only() {
        assert!(!is_link_only(""));
        assert!(!is_link_only("   "));
        assert!(!is_link_only("plain text"));
        assert!(!is_link_only("see https://example.com"));
        assert!(!is_link_only("[docs](/docs)"));
        assert!(!is_link_only("- https://example.com"));
    }

    #[test]
    fn test_extract_bare() {
        let links = extract_links("https://a.com https://b.com/x");
        assert_eq!(
            links,
            vec![
                LinkSpan {
                    display_text: "https://a.com".into(),
                    target_url: "https://a.com".into()
                },
                LinkSpan {
                    display_text: "https://b.com/x".into(),
                    target_url: "https://b.com/x".into()
                },
            ]
        );
    }

    #[test]
    fn test_extract_markdown_and_bare_in_order() {
        let links = extract_links("[First](https://a.com) https://b.com");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].display_text, "First");
        assert_eq!(links[0].target_url, "https://a.com");
        assert_eq!(links[1].target_url, "https://b.com");
    }

    #[test]
    fn test_extract_empty_text_uses_url() {
        let links = extract_links("[](https://a.com)");
        assert_eq!(links[0].display_text, "https://a.com");
    }

    #[test]
    fn test_extract_skips_unparseable() {
        assert!(extract_links("[broken]()").is_empty());
        assert!(extract_links("[broken](https://)").is_empty());
    }
}
