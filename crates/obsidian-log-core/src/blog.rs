//! Blog listing helpers: plain-text previews, search, and post drafts.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::entry::{ContentKind, Entry};
use crate::validate;

/// Characters kept in a listing preview.
pub const PREVIEW_LENGTH: usize = 100;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6}\s+").expect("heading regex should compile"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("bold regex should compile"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*").expect("italic regex should compile"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("code regex should compile"));
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").expect("image regex should compile"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("link regex should compile"));
static LIST_BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:[-*+]|\d+\.)\s+").expect("list regex should compile")
});
static NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\n+\s*").expect("newline regex should compile"));

/// Plain-text preview of a markdown body, truncated to `max_chars`
/// characters with a trailing ellipsis.
pub fn preview(body: &str, max_chars: usize) -> String {
    let text = HEADING.replace_all(body, "");
    let text = BOLD.replace_all(&text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = IMAGE.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "$1");
    let text = LIST_BULLET.replace_all(&text, "");
    let text = NEWLINES.replace_all(&text, " ");
    let text = text.trim();

    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}…", truncated.trim_end())
}

/// Whether `entry` matches every whitespace-separated term of `query`,
/// case-insensitively, in its title or body. An empty query matches.
pub fn matches_search(entry: &Entry, query: &str) -> bool {
    let haystack = format!("{} {}", entry.title, entry.body).to_lowercase();
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .all(|term| haystack.contains(&term))
}

/// Whether `entry` carries `tag` (case-insensitive). An empty tag matches.
pub fn has_tag(entry: &Entry, tag: &str) -> bool {
    let tag = tag.trim();
    tag.is_empty() || entry.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

/// Sorted, de-duplicated tags across `entries`.
pub fn all_tags(entries: &[Entry]) -> Vec<String> {
    let mut tags: Vec<String> = entries.iter().flat_map(|e| e.tags.clone()).collect();
    tags.sort_by_key(|t| t.to_lowercase());
    tags.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
    tags
}

/// An admin-submitted blog post.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BlogDraft {
    pub slug: String,
    pub title: String,
    pub body: String,
    /// Comma-separated tags.
    pub tags: String,
    pub published: Option<bool>,
}

impl BlogDraft {
    /// Validate the draft and build the entry to commit.
    ///
    /// `slug` overrides the draft's own slug (used by updates, where the
    /// slug comes from the URL). `created_at` is kept as given.
    pub fn into_entry(self, slug: Option<&str>, created_at: String) -> crate::Result<Entry> {
        let slug = slug.unwrap_or(&self.slug).trim().to_string();
        validate::validate_slug(&slug)?;

        let title = match self.title.trim() {
            "" => slug.clone(),
            title => {
                validate::validate_title(title)?;
                title.to_string()
            }
        };

        let tags = self
            .tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Entry {
            kind: ContentKind::Blog,
            slug,
            title,
            emoji: None,
            body: self.body,
            created_at: Some(created_at),
            updated_at: None,
            tags,
            published: self.published.unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, body: &str, tags: &[&str]) -> Entry {
        Entry {
            kind: ContentKind::Blog,
            slug: "s".into(),
            title: title.into(),
            emoji: None,
            body: body.into(),
            created_at: None,
            updated_at: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            published: true,
        }
    }

    #[test]
    fn test_preview_strips_markdown() {
        let body = "# Heading\n\nSome **bold** and *italic* with `code`.\n\n- item [link](https://x.com)\n";
        assert_eq!(
            preview(body, PREVIEW_LENGTH),
            "Heading Some bold and italic with code. item link"
        );
    }

    #[test]
    fn test_preview_truncates_on_chars() {
        let body = "あ".repeat(150);
        let result = preview(&body, PREVIEW_LENGTH);
        assert_eq!(result.chars().count(), PREVIEW_LENGTH + 1);
        assert!(result.ends_with('…'));
    }

    #[test]
    fn test_preview_short_is_untouched() {
        assert_eq!(preview("short", PREVIEW_LENGTH), "short");
        assert_eq!(preview("", PREVIEW_LENGTH), "");
    }

    #[test]
    fn test_search_all_terms() {
        let e = entry("Rust Notes", "Working with axum and tokio", &[]);
        assert!(matches_search(&e, ""));
        assert!(matches_search(&e, "rust"));
        assert!(matches_search(&e, "AXUM tokio"));
        assert!(!matches_search(&e, "rust python"));
    }

    #[test]
    fn test_has_tag() {
        let e = entry("t", "b", &["Rust", "web"]);
        assert!(has_tag(&e, ""));
        assert!(has_tag(&e, "rust"));
        assert!(!has_tag(&e, "go"));
    }

    #[test]
    fn test_all_tags_dedup() {
        let entries = vec![entry("a", "", &["web", "Rust"]), entry("b", "", &["rust", "axum"])];
        assert_eq!(all_tags(&entries), vec!["axum", "Rust", "web"]);
    }

    #[test]
    fn test_draft_into_entry() {
        let draft = BlogDraft {
            slug: "hello".into(),
            title: "  ".into(),
            body: "Body".into(),
            tags: " a, ,b ,".into(),
            published: None,
        };
        let entry = draft.into_entry(None, "2024-01-01T00:00:00Z".into()).unwrap();
        assert_eq!(entry.slug, "hello");
        assert_eq!(entry.title, "hello");
        assert_eq!(entry.tags, vec!["a", "b"]);
        assert!(entry.published);
        assert_eq!(entry.created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_draft_slug_override_and_validation() {
        let draft = BlogDraft {
            slug: "ignored".into(),
            ..Default::default()
        };
        let entry = draft.clone().into_entry(Some("from-url"), "d".into()).unwrap();
        assert_eq!(entry.slug, "from-url");

        assert!(draft.into_entry(Some("bad slug"), "d".into()).is_err());
    }
}
