//! Markdown entries from the remote mirror or the local content root.

use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use obsidian_log_core::entry::{self, slug_from_filename};
use obsidian_log_core::validate::is_valid_slug;
use obsidian_log_core::{AppConfig, ContentKind, ContentSourceDecision, Entry, RepoLocation, decide};

use crate::github::RepoContents;

/// Entry files fetched from GitHub at once when listing a directory.
pub const REMOTE_FETCH_CONCURRENCY: usize = 8;

/// Reads content entries according to the content source decision.
///
/// Failures never surface to pages: they are logged and read as "nothing
/// there".
pub struct ContentLoader {
    github: Arc<dyn RepoContents>,
    env_repo_url: String,
    content_dir: PathBuf,
}

impl ContentLoader {
    pub fn new(github: Arc<dyn RepoContents>, env_repo_url: String, content_dir: PathBuf) -> Self {
        Self {
            github,
            env_repo_url,
            content_dir,
        }
    }

    /// Where to read from. A config without a repository falls back to the
    /// environment repository before choosing local files.
    pub fn source_for(&self, config: &AppConfig) -> ContentSourceDecision {
        let decision = decide(config);
        if decision.use_remote {
            return decision;
        }
        match RepoLocation::parse(&self.env_repo_url) {
            Some(location) => ContentSourceDecision {
                use_remote: true,
                remote_location: Some(location),
            },
            None => decision,
        }
    }

    /// Repository that blog posts are committed to.
    pub fn write_location(&self, config: &AppConfig) -> Option<RepoLocation> {
        self.source_for(config).remote_location
    }

    /// Published entries of `kind`, newest first.
    pub async fn list(&self, config: &AppConfig, kind: ContentKind) -> Vec<Entry> {
        let mut entries = match self.source_for(config).remote_location {
            Some(location) => self.list_remote(&location, kind).await,
            None => self.list_local(kind).await,
        };
        entries.retain(|e| e.published);
        entry::sort_entries(&mut entries);
        entries
    }

    /// A single published entry.
    pub async fn get(&self, config: &AppConfig, kind: ContentKind, slug: &str) -> Option<Entry> {
        if !is_valid_slug(slug) {
            return None;
        }
        let raw = match self.source_for(config).remote_location {
            Some(location) => {
                let path = format!("{}/{slug}.md", kind.dir());
                match self.github.get_file(&location, &path, None).await {
                    Ok(file) => file?.content,
                    Err(e) => {
                        tracing::warn!(repo = %location, path = %path, error = %e, "failed to fetch entry");
                        return None;
                    }
                }
            }
            None => {
                let path = self.content_dir.join(kind.dir()).join(format!("{slug}.md"));
                tokio::fs::read_to_string(&path).await.ok()?
            }
        };

        parse_logged(kind, slug, &raw).filter(|e| e.published)
    }

    async fn list_remote(&self, location: &RepoLocation, kind: ContentKind) -> Vec<Entry> {
        let listing = match self.github.list_dir(location, kind.dir(), None).await {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!(repo = %location, dir = kind.dir(), error = %e, "failed to list entries");
                return Vec::new();
            }
        };

        let files: Vec<_> = listing
            .into_iter()
            .filter(|item| item.is_file())
            .filter_map(|item| {
                let slug = slug_from_filename(&item.name)?.to_string();
                Some((slug, item.path))
            })
            .collect();

        let fetches: Vec<_> = files.iter().map(|(slug, path)| async move {
            match self.github.get_file(location, path, None).await {
                Ok(Some(file)) => parse_logged(kind, slug, &file.content),
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(repo = %location, path = %path, error = %e, "failed to fetch entry");
                    None
                }
            }
        }).collect();

        stream::iter(fetches)
            .buffer_unordered(REMOTE_FETCH_CONCURRENCY)
            .filter_map(|entry| async move { entry })
            .collect()
            .await
    }

    async fn list_local(&self, kind: ContentKind) -> Vec<Entry> {
        let dir = self.content_dir.join(kind.dir());
        let mut read_dir = match tokio::fs::read_dir(&dir).await {
            Ok(read_dir) => read_dir,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "no local content directory");
                return Vec::new();
            }
        };

        let mut entries = Vec::new();
        loop {
            let item = match read_dir.next_entry().await {
                Ok(Some(item)) => item,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "failed to read content directory");
                    break;
                }
            };

            let name = item.file_name();
            let Some(slug) = name.to_str().and_then(slug_from_filename) else {
                continue;
            };
            match tokio::fs::read_to_string(item.path()).await {
                Ok(raw) => entries.extend(parse_logged(kind, slug, &raw)),
                Err(e) => {
                    tracing::warn!(path = %item.path().display(), error = %e, "failed to read entry");
                }
            }
        }
        entries
    }
}

fn parse_logged(kind: ContentKind, slug: &str, raw: &str) -> Option<Entry> {
    match Entry::parse(kind, slug, raw) {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::warn!(kind = kind.dir(), slug = %slug, error = %e, "skipping malformed entry");
            None
        }
    }
}
