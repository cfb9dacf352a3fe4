//! Link-card metadata fetching with an in-process cache.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use obsidian_log_core::metadata::{self, FETCH_TIMEOUT, MAX_HTML_LENGTH, USER_AGENT};
use obsidian_log_core::{PageMetadata, is_safe_for_link};

/// Metadata cache capacity (entries are a title and a URL).
const METADATA_CACHE_CAPACITY: u64 = 10_000;

/// Metadata cache TTL.
const METADATA_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Source of link-card metadata. Never fails: problems yield an empty
/// [`PageMetadata`].
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch(&self, url: &str) -> PageMetadata;
}

/// Fetches pages over HTTP and extracts title/image.
pub struct HttpMetadataFetcher {
    http: reqwest::Client,
    cache: Cache<String, PageMetadata>,
}

impl HttpMetadataFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(METADATA_CACHE_CAPACITY)
            .time_to_live(METADATA_CACHE_TTL)
            .build();

        tracing::info!(
            cache_capacity = METADATA_CACHE_CAPACITY,
            cache_ttl_secs = METADATA_CACHE_TTL.as_secs(),
            "page metadata fetcher initialized"
        );

        Ok(Self { http, cache })
    }

    async fn fetch_uncached(&self, url: &str) -> Result<Option<PageMetadata>, reqwest::Error> {
        let mut response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::debug!(url = %url, status = %response.status(), "metadata fetch non-2xx");
            return Ok(None);
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"));
        if !is_html {
            return Ok(None);
        }

        // Relative og:image paths resolve against the post-redirect URL.
        let final_url = response.url().to_string();

        let mut body = Vec::with_capacity(16 * 1024);
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            if body.len() >= MAX_HTML_LENGTH {
                break;
            }
        }

        let html = String::from_utf8_lossy(&body);
        let html = metadata::truncate_html(&html);
        Ok(Some(PageMetadata::from_html(html, &final_url)))
    }
}

#[async_trait]
impl MetadataSource for HttpMetadataFetcher {
    async fn fetch(&self, url: &str) -> PageMetadata {
        if !is_safe_for_link(url) {
            return PageMetadata::default();
        }
        let url = url.trim();

        if let Some(cached) = self.cache.get(url).await {
            return cached;
        }

        match self.fetch_uncached(url).await {
            Ok(result) => {
                let result = result.unwrap_or_default();
                self.cache.insert(url.to_string(), result.clone()).await;
                result
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "metadata fetch failed");
                PageMetadata::default()
            }
        }
    }
}
