//! Effective site configuration: remote document, local fallback, defaults.
//!
//! Reads go remote → local → default with no merging between tiers, and
//! never fail. Writes go through [`ConfigResolver::update`], which requires
//! an admin and commits the whole document back to the mirror repository.

use std::path::PathBuf;
use std::sync::Arc;

use obsidian_log_core::config::{self, RepoLocation};
use obsidian_log_core::{AppConfig, CONFIG_PATH, Identity, is_valid_repo_url, validate};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::admin_gate;
use crate::error::SiteError;
use crate::github::{FileCommit, RepoContents};

/// Commit message for configuration writes.
pub const CONFIG_COMMIT_MESSAGE: &str = "chore: update obsidian-log config";

/// Candidate configuration submitted by an admin.
///
/// `admins` stays loosely typed: non-string entries are dropped rather than
/// rejecting the request. Presentation fields left out keep their current
/// value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    pub github_repo_url: Option<String>,
    pub zenn_username: String,
    pub admins: Vec<Value>,
    pub site_title: Option<String>,
    pub site_subtitle: Option<String>,
    pub author_name: Option<String>,
    pub author_icon: Option<String>,
}

pub struct ConfigResolver {
    github: Arc<dyn RepoContents>,
    env_repo_url: String,
    env_token: Option<String>,
    content_dir: PathBuf,
}

impl ConfigResolver {
    pub fn new(
        github: Arc<dyn RepoContents>,
        env_repo_url: String,
        env_token: Option<String>,
        content_dir: PathBuf,
    ) -> Self {
        Self {
            github,
            env_repo_url,
            env_token,
            content_dir,
        }
    }

    /// The effective configuration. Never fails.
    pub async fn resolve(&self) -> AppConfig {
        if let Some(location) = RepoLocation::parse(&self.env_repo_url) {
            match self.github.get_file(&location, CONFIG_PATH, None).await {
                Ok(Some(file)) => return AppConfig::from_json(&file.content),
                Ok(None) => {
                    tracing::debug!(repo = %location, "no remote config, using local fallback");
                }
                Err(e) => {
                    tracing::warn!(repo = %location, error = %e, "remote config fetch failed");
                }
            }
        }

        let content_dir = self.content_dir.clone();
        match tokio::task::spawn_blocking(move || config::load_local(&content_dir)).await {
            Ok(Some(config)) => config,
            Ok(None) => AppConfig::default(),
            Err(e) => {
                tracing::warn!(error = %e, "local config read panicked");
                AppConfig::default()
            }
        }
    }

    /// Validate and commit a new configuration on behalf of `actor`.
    ///
    /// The target repository is the candidate URL if valid, else the
    /// currently resolved one, else the environment one. The write credential
    /// is `provider_token`, else the environment token.
    pub async fn update(
        &self,
        candidate: ConfigUpdate,
        actor: Option<&Identity>,
        provider_token: Option<&str>,
    ) -> Result<AppConfig, SiteError> {
        let current = self.resolve().await;
        admin_gate(actor, &current)?;

        let display_username = candidate.zenn_username.trim().to_string();
        validate::validate_display_username(&display_username)?;
        let admin_identities = validate::normalize_admins(&candidate.admins)?;

        let repository_url = [
            candidate.github_repo_url.as_deref().unwrap_or_default(),
            current.repository_url.as_str(),
            self.env_repo_url.as_str(),
        ]
        .into_iter()
        .map(str::trim)
        .find(|url| url.chars().count() <= validate::REPO_URL_MAX && is_valid_repo_url(url))
        .map(str::to_string)
        .ok_or_else(|| {
            SiteError::Validation("A valid GitHub repository URL is required".to_string())
        })?;

        let token = provider_token
            .or(self.env_token.as_deref())
            .ok_or_else(|| {
                SiteError::Validation(
                    "A GitHub token is required to save the configuration".to_string(),
                )
            })?;

        let keep_or = |new: Option<String>, old: String| new.map(|v| v.trim().to_string()).unwrap_or(old);
        let next = AppConfig {
            repository_url,
            display_username,
            admin_identities,
            site_title: keep_or(candidate.site_title, current.site_title),
            site_subtitle: keep_or(candidate.site_subtitle, current.site_subtitle),
            author_name: keep_or(candidate.author_name, current.author_name),
            author_icon: keep_or(candidate.author_icon, current.author_icon),
        };

        let location = next.repo_location().ok_or_else(|| {
            SiteError::Validation("A valid GitHub repository URL is required".to_string())
        })?;
        let document = next.to_pretty_json()?;

        let sha = self
            .github
            .get_file(&location, CONFIG_PATH, Some(token))
            .await?
            .map(|file| file.sha);

        self.github
            .put_file(
                &location,
                CONFIG_PATH,
                FileCommit {
                    content: &document,
                    message: CONFIG_COMMIT_MESSAGE,
                    sha: sha.as_deref(),
                    token,
                },
            )
            .await?;

        tracing::info!(repo = %location, admins = next.admin_identities.len(), "site configuration updated");
        Ok(next)
    }
}
