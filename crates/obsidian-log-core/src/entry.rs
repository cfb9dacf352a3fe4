//! Markdown content entries with optional YAML front matter.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::Result;

/// The kinds of content the site mirrors, each in its own directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Article,
    Scrap,
    Blog,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [Self::Article, Self::Scrap, Self::Blog];

    /// Directory name in the repository and under the content root.
    pub fn dir(self) -> &'static str {
        match self {
            Self::Article => "articles",
            Self::Scrap => "scraps",
            Self::Blog => "blog",
        }
    }

    /// URL path prefix for listing and detail pages.
    pub fn route(self) -> &'static str {
        match self {
            Self::Article => "/articles",
            Self::Scrap => "/scraps",
            Self::Blog => "/blog",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Article => "Articles",
            Self::Scrap => "Scraps",
            Self::Blog => "Blog",
        }
    }
}

/// Front matter fields recognised in content files.
///
/// Zenn-style (`topics`, `published`) and blog-style (`tags`, `visibility`)
/// keys are both accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(alias = "topics", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(
        alias = "createdAt",
        alias = "published_at",
        alias = "date",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
    #[serde(alias = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
}

/// Split `---` delimited front matter from the body.
///
/// Returns `(None, raw)` when the document doesn't open with a complete
/// front matter block.
pub fn split_front_matter(raw: &str) -> (Option<&str>, &str) {
    let Some(rest) = raw
        .strip_prefix("---\n")
        .or_else(|| raw.strip_prefix("---\r\n"))
    else {
        return (None, raw);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, raw)
}

/// A parsed content file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub kind: ContentKind,
    pub slug: String,
    pub title: String,
    pub emoji: Option<String>,
    pub body: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
}

impl Entry {
    /// Parse a markdown file. A missing title falls back to the slug.
    pub fn parse(kind: ContentKind, slug: &str, raw: &str) -> Result<Self> {
        let (yaml, body) = split_front_matter(raw);
        let front: FrontMatter = match yaml {
            Some(yaml) if !yaml.trim().is_empty() => serde_yaml::from_str(yaml)?,
            _ => FrontMatter::default(),
        };

        let private = front
            .visibility
            .as_deref()
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("private"));
        let published = front.published.unwrap_or(true) && !private;

        let title = front
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| slug.to_string());

        Ok(Self {
            kind,
            slug: slug.to_string(),
            title,
            emoji: front.emoji.filter(|e| !e.trim().is_empty()),
            body: body.trim_start_matches(['\r', '\n']).to_string(),
            created_at: front.created_at,
            updated_at: front.updated_at,
            tags: front
                .tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            published,
        })
    }

    /// Render back to a markdown document with front matter.
    pub fn to_markdown(&self) -> Result<String> {
        let front = FrontMatter {
            title: Some(self.title.clone()),
            emoji: self.emoji.clone(),
            tags: self.tags.clone(),
            published: (!self.published).then_some(false),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
            visibility: None,
        };
        let yaml = serde_yaml::to_string(&front)?;
        Ok(format!("---\n{yaml}---\n\n{}", self.body))
    }

    /// The date part of `created_at`, for display.
    pub fn created_date(&self) -> Option<&str> {
        self.created_at
            .as_deref()
            .map(|d| d.get(..10).unwrap_or(d))
    }
}

/// Slug of a markdown filename (`hello.md` -> `hello`).
pub fn slug_from_filename(name: &str) -> Option<&str> {
    let slug = name.strip_suffix(".md")?;
    crate::validate::is_valid_slug(slug).then_some(slug)
}

/// Sort newest first by `created_at` (undated last), then by slug.
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| {
        let by_date = match (&a.created_at, &b.created_at) {
            (Some(a), Some(b)) => b.cmp(a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_date.then_with(|| a.slug.cmp(&b.slug))
    });
}
