//! Title and image extraction from fetched HTML, for link cards.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Timeout for a metadata fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum number of HTML bytes inspected.
pub const MAX_HTML_LENGTH: usize = 100_000;

/// User agent sent with metadata fetches.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; ObsidianLog/1.0; +https://github.com)";

/// Title and preview image for a page. Both are best effort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl PageMetadata {
    /// Extract metadata from an HTML document served at `base_url`.
    pub fn from_html(html: &str, base_url: &str) -> Self {
        Self {
            title: extract_title(html),
            image: extract_image(html, base_url),
        }
    }
}

fn meta_regex(attr: &str, name: &str, content_first: bool) -> Regex {
    let pattern = if content_first {
        format!(r#"(?i)<meta[^>]+content=["']([^"']+)["'][^>]+{attr}=["']{name}["']"#)
    } else {
        format!(r#"(?i)<meta[^>]+{attr}=["']{name}["'][^>]+content=["']([^"']+)["']"#)
    };
    Regex::new(&pattern).expect("meta regex should compile")
}

static OG_TITLE: LazyLock<Regex> = LazyLock::new(|| meta_regex("property", "og:title", false));
static OG_TITLE_REV: LazyLock<Regex> = LazyLock::new(|| meta_regex("property", "og:title", true));
static TWITTER_TITLE: LazyLock<Regex> =
    LazyLock::new(|| meta_regex("name", "twitter:title", false));
static OG_IMAGE: LazyLock<Regex> = LazyLock::new(|| meta_regex("property", "og:image", false));
static OG_IMAGE_REV: LazyLock<Regex> = LazyLock::new(|| meta_regex("property", "og:image", true));
static TWITTER_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| meta_regex("name", "twitter:image", false));
static TWITTER_IMAGE_REV: LazyLock<Regex> =
    LazyLock::new(|| meta_regex("name", "twitter:image", true));

static TITLE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title regex should compile")
});
static INNER_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex should compile"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex should compile"));

fn first_capture<'a>(html: &'a str, patterns: &[&Regex]) -> Option<&'a str> {
    patterns
        .iter()
        .filter_map(|re| re.captures(html)?.get(1))
        .map(|m| m.as_str().trim())
        .find(|s| !s.is_empty())
}

/// The page title: `og:title`, then `twitter:title`, then `<title>`.
pub fn extract_title(html: &str) -> Option<String> {
    if let Some(title) = first_capture(html, &[&OG_TITLE, &TWITTER_TITLE, &OG_TITLE_REV]) {
        return Some(decode_html_entities(title));
    }

    let raw = TITLE_TAG.captures(html)?.get(1)?.as_str();
    let stripped = INNER_TAG.replace_all(raw, "");
    let collapsed = WHITESPACE.replace_all(stripped.trim(), " ");
    if collapsed.is_empty() {
        return None;
    }
    Some(decode_html_entities(&collapsed))
}

/// The preview image (`og:image`, then `twitter:image`) resolved against
/// `base_url`.
pub fn extract_image(html: &str, base_url: &str) -> Option<String> {
    let raw = first_capture(
        html,
        &[&OG_IMAGE, &OG_IMAGE_REV, &TWITTER_IMAGE, &TWITTER_IMAGE_REV],
    )?;
    let raw = decode_html_entities(raw);

    match url::Url::parse(base_url).and_then(|base| base.join(&raw)) {
        Ok(resolved) => Some(resolved.to_string()),
        Err(_) => Some(raw),
    }
}

/// Decode the handful of entities that show up in titles.
pub fn decode_html_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Truncate an HTML body to at most [`MAX_HTML_LENGTH`] bytes on a char
/// boundary.
pub fn truncate_html(body: &str) -> &str {
    if body.len() <= MAX_HTML_LENGTH {
        return body;
    }
    let mut end = MAX_HTML_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
