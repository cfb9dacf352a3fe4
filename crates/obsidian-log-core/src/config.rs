//! Site configuration document and repository URL handling.
//!
//! The configuration lives at [`CONFIG_PATH`](crate::CONFIG_PATH) in the
//! remote mirror, with a local fallback under the content root. Parsing is
//! deliberately lenient: every field defaults independently, and a document
//! that isn't a JSON object yields [`AppConfig::default`].

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::CONFIG_PATH;

/// `https://host/{owner}/{repo}` with an optional trailing slash.
static REPO_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://[A-Za-z0-9.-]+(?::[0-9]+)?/([A-Za-z0-9_-]+)/([A-Za-z0-9_.-]+)/?$")
        .expect("repo URL regex should compile")
});

/// The site configuration.
///
/// Serialized field names match the on-disk document, which predates the
/// Rust names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Repository the site mirrors content from. Empty means local content.
    #[serde(rename = "github_repo_url")]
    pub repository_url: String,

    /// Username on the external publishing platform (Zenn).
    #[serde(rename = "zenn_username")]
    pub display_username: String,

    /// Provider usernames allowed to administer the site.
    #[serde(rename = "admins")]
    pub admin_identities: Vec<String>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub site_title: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub site_subtitle: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub author_name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub author_icon: String,
}

impl AppConfig {
    /// Parse a configuration document, defaulting anything missing or
    /// wrongly typed.
    ///
    /// Never fails: malformed JSON and non-object documents produce the
    /// all-default config, and non-string admin entries are dropped.
    pub fn from_json(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_value(&value),
            Err(_) => Self::default(),
        }
    }

    /// Same defaulting rules as [`AppConfig::from_json`], from a parsed value.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let string_field = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_default()
        };

        let admin_identities = obj
            .get("admins")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            repository_url: string_field("github_repo_url"),
            display_username: string_field("zenn_username"),
            admin_identities,
            site_title: string_field("site_title"),
            site_subtitle: string_field("site_subtitle"),
            author_name: string_field("author_name"),
            author_icon: string_field("author_icon"),
        }
    }

    /// Serialize as the on-disk document: pretty-printed, two-space indent.
    pub fn to_pretty_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Owner/repo of the configured repository, if the URL is well-formed.
    pub fn repo_location(&self) -> Option<RepoLocation> {
        RepoLocation::parse(&self.repository_url)
    }

    /// Site title, falling back to the built-in default.
    pub fn title(&self) -> &str {
        non_empty_or(&self.site_title, crate::DEFAULT_SITE_TITLE)
    }

    /// Site subtitle, falling back to the built-in default.
    pub fn subtitle(&self) -> &str {
        non_empty_or(&self.site_subtitle, crate::DEFAULT_SITE_SUBTITLE)
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// An `{owner, repo}` pair parsed from a repository URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoLocation {
    pub owner: String,
    pub repo: String,
}

impl RepoLocation {
    /// Parse `https://host/{owner}/{repo}`. Returns `None` for anything else.
    pub fn parse(url: &str) -> Option<Self> {
        let caps = REPO_URL_REGEX.captures(url.trim())?;
        let owner = caps.get(1)?.as_str();
        let repo = caps.get(2)?.as_str();

        if repo == "." || repo == ".." {
            return None;
        }

        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

impl std::fmt::Display for RepoLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Whether `url` is a well-formed repository URL.
pub fn is_valid_repo_url(url: &str) -> bool {
    RepoLocation::parse(url).is_some()
}

/// Path of the local fallback configuration file under `content_root`.
pub fn local_config_path(content_root: &Path) -> PathBuf {
    content_root.join(CONFIG_PATH)
}

/// Read the local fallback configuration file.
///
/// Returns `None` when the file is absent or unreadable; a readable file is
/// always parsed (malformed contents produce the default config).
pub fn load_local(content_root: &Path) -> Option<AppConfig> {
    let path = local_config_path(content_root);
    let raw = std::fs::read_to_string(path).ok()?;
    Some(AppConfig::from_json(&raw))
}
