//! GitHub contents API client.
//!
//! Reads and writes single files in the mirror repository. Writes carry the
//! blob `sha` of the version they replace; GitHub rejects the commit when it
//! is stale, which surfaces as [`GithubError::Conflict`].

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use obsidian_log_core::RepoLocation;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::SiteError;

/// Timeout for GitHub API calls.
const GITHUB_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest raw asset served through the proxy.
pub const MAX_ASSET_BYTES: usize = 10 * 1024 * 1024;

/// Errors returned by the contents API.
#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The content hash sent with a write no longer matches.
    #[error("file changed since it was read")]
    Conflict,

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("asset exceeds {MAX_ASSET_BYTES} bytes")]
    TooLarge,
}

impl From<GithubError> for SiteError {
    fn from(err: GithubError) -> Self {
        match err {
            GithubError::Conflict => Self::Conflict(
                "The file was changed by someone else. Reload and try again.".to_string(),
            ),
            GithubError::TooLarge => {
                Self::Validation("The asset is too large to proxy".to_string())
            }
            other => Self::Upstream(format!("github: {other}")),
        }
    }
}

/// A file read from the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Blob sha, used as the optimistic concurrency token for writes.
    pub sha: String,
    pub content: String,
}

/// A directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl RemoteEntry {
    pub fn is_file(&self) -> bool {
        self.kind == "file"
    }
}

/// A commit of one file.
#[derive(Debug, Clone, Copy)]
pub struct FileCommit<'a> {
    pub content: &'a str,
    pub message: &'a str,
    /// Sha of the version being replaced; `None` creates the file.
    pub sha: Option<&'a str>,
    pub token: &'a str,
}

/// Raw bytes fetched from `raw.githubusercontent.com`.
#[derive(Debug, Clone)]
pub struct RawAsset {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Access to repository contents.
///
/// `token` overrides the client's default credential for that call.
#[async_trait]
pub trait RepoContents: Send + Sync {
    /// Read a file. `Ok(None)` when it doesn't exist.
    async fn get_file(
        &self,
        location: &RepoLocation,
        path: &str,
        token: Option<&str>,
    ) -> Result<Option<RemoteFile>, GithubError>;

    /// List a directory. Empty when it doesn't exist.
    async fn list_dir(
        &self,
        location: &RepoLocation,
        path: &str,
        token: Option<&str>,
    ) -> Result<Vec<RemoteEntry>, GithubError>;

    /// Create or replace a file.
    async fn put_file(
        &self,
        location: &RepoLocation,
        path: &str,
        commit: FileCommit<'_>,
    ) -> Result<(), GithubError>;

    /// Fetch a raw content URL. `Ok(None)` on 404, [`GithubError::TooLarge`]
    /// past [`MAX_ASSET_BYTES`].
    async fn get_raw(&self, url: &str) -> Result<Option<RawAsset>, GithubError>;
}

#[derive(Debug, Deserialize)]
struct ContentsFile {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Debug, Serialize)]
struct PutContents<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

/// Decode the base64 payload of a contents response. GitHub wraps it at 60
/// columns.
fn decode_content(content: &str, encoding: &str) -> Result<String, GithubError> {
    if !encoding.is_empty() && encoding != "base64" {
        return Err(GithubError::Decode(format!("unsupported encoding {encoding}")));
    }
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact)
        .map_err(|e| GithubError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| GithubError::Decode(e.to_string()))
}

/// reqwest-backed [`RepoContents`].
#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(api_url: &str, token: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(GITHUB_TIMEOUT)
            .user_agent(concat!("obsidian-log/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn contents_url(&self, location: &RepoLocation, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url,
            location.owner,
            location.repo,
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: reqwest::Method, url: &str, token: Option<&str>) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        match token.or(self.token.as_deref()) {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

async fn status_error(response: reqwest::Response) -> GithubError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    GithubError::Status { status, body }
}

#[async_trait]
impl RepoContents for GithubClient {
    async fn get_file(
        &self,
        location: &RepoLocation,
        path: &str,
        token: Option<&str>,
    ) -> Result<Option<RemoteFile>, GithubError> {
        let url = self.contents_url(location, path);
        let response = self.request(reqwest::Method::GET, &url, token).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let file: ContentsFile = response
            .json()
            .await
            .map_err(|e| GithubError::Decode(e.to_string()))?;
        let content = decode_content(&file.content, &file.encoding)?;

        tracing::debug!(repo = %location, path = %path, sha = %file.sha, "fetched file");
        Ok(Some(RemoteFile {
            sha: file.sha,
            content,
        }))
    }

    async fn list_dir(
        &self,
        location: &RepoLocation,
        path: &str,
        token: Option<&str>,
    ) -> Result<Vec<RemoteEntry>, GithubError> {
        let url = self.contents_url(location, path);
        let response = self.request(reqwest::Method::GET, &url, token).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        response
            .json::<Vec<RemoteEntry>>()
            .await
            .map_err(|e| GithubError::Decode(format!("{path} is not a directory: {e}")))
    }

    async fn put_file(
        &self,
        location: &RepoLocation,
        path: &str,
        commit: FileCommit<'_>,
    ) -> Result<(), GithubError> {
        let url = self.contents_url(location, path);
        let body = PutContents {
            message: commit.message,
            content: BASE64.encode(commit.content),
            sha: commit.sha,
        };

        let response = self
            .request(reqwest::Method::PUT, &url, Some(commit.token))
            .json(&body)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                tracing::info!(repo = %location, path = %path, "committed file");
                Ok(())
            }
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                tracing::warn!(repo = %location, path = %path, "stale sha on commit");
                Err(GithubError::Conflict)
            }
            _ => Err(status_error(response).await),
        }
    }

    async fn get_raw(&self, url: &str) -> Result<Option<RawAsset>, GithubError> {
        let mut response = self.request(reqwest::Method::GET, url, None).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if response
            .content_length()
            .is_some_and(|len| len > MAX_ASSET_BYTES as u64)
        {
            return Err(GithubError::TooLarge);
        }
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if bytes.len() + chunk.len() > MAX_ASSET_BYTES {
                return Err(GithubError::TooLarge);
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(Some(RawAsset {
            content_type,
            bytes,
        }))
    }
}
