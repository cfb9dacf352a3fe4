//! Row-style access to the managed content store (PostgREST).
//!
//! Rows come back as untyped JSON; callers parse them into typed entities
//! and skip what doesn't fit.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::SupabaseConfig;
use crate::error::SiteError;

const STORE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
}

impl From<StoreError> for SiteError {
    fn from(err: StoreError) -> Self {
        Self::Upstream(format!("content store: {err}"))
    }
}

/// Equality filters and ordering for a select, update or delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowQuery {
    pub filters: Vec<(String, String)>,
    pub order: Option<(String, bool)>,
}

impl RowQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.filters.push((column.to_string(), value.into()));
        self
    }

    /// Order by `column`, newest/largest first when `descending`.
    pub fn order_by(mut self, column: &str, descending: bool) -> Self {
        self.order = Some((column.to_string(), descending));
        self
    }

    /// PostgREST query parameters.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .filters
            .iter()
            .map(|(column, value)| (column.clone(), format!("eq.{value}")))
            .collect();
        if let Some((column, descending)) = &self.order {
            let direction = if *descending { "desc" } else { "asc" };
            params.push(("order".to_string(), format!("{column}.{direction}")));
        }
        params
    }
}

/// Operations on named collections. `auth` is the caller's access token;
/// without it requests run with the public key only.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn select(
        &self,
        collection: &str,
        query: &RowQuery,
        auth: Option<&str>,
    ) -> Result<Vec<Value>, StoreError>;

    async fn insert(&self, collection: &str, row: &Value, auth: Option<&str>)
    -> Result<(), StoreError>;

    /// Returns the number of rows changed.
    async fn update(
        &self,
        collection: &str,
        query: &RowQuery,
        patch: &Value,
        auth: Option<&str>,
    ) -> Result<usize, StoreError>;

    /// Returns the number of rows removed.
    async fn delete(
        &self,
        collection: &str,
        query: &RowQuery,
        auth: Option<&str>,
    ) -> Result<usize, StoreError>;

    /// Insert, or merge into the existing row with the same `key_column`.
    async fn upsert(
        &self,
        collection: &str,
        key_column: &str,
        row: &Value,
        auth: Option<&str>,
    ) -> Result<(), StoreError>;
}

/// PostgREST-backed [`ContentStore`].
pub struct PostgrestStore {
    http: reqwest::Client,
    rest_url: String,
    anon_key: String,
}

impl PostgrestStore {
    pub fn new(config: &SupabaseConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(STORE_TIMEOUT).build()?;
        Ok(Self {
            http,
            rest_url: format!("{}/rest/v1", config.url),
            anon_key: config.anon_key.clone(),
        })
    }

    fn request(
        &self,
        method: reqwest::Method,
        collection: &str,
        auth: Option<&str>,
    ) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}/{collection}", self.rest_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(auth.unwrap_or(&self.anon_key))
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status { status, body })
}

async fn returned_rows(response: reqwest::Response) -> Result<usize, StoreError> {
    let rows: Vec<Value> = check(response).await?.json().await?;
    Ok(rows.len())
}

#[async_trait]
impl ContentStore for PostgrestStore {
    async fn select(
        &self,
        collection: &str,
        query: &RowQuery,
        auth: Option<&str>,
    ) -> Result<Vec<Value>, StoreError> {
        let response = self
            .request(reqwest::Method::GET, collection, auth)
            .query(&[("select", "*")])
            .query(&query.to_params())
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn insert(
        &self,
        collection: &str,
        row: &Value,
        auth: Option<&str>,
    ) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::POST, collection, auth)
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        query: &RowQuery,
        patch: &Value,
        auth: Option<&str>,
    ) -> Result<usize, StoreError> {
        let response = self
            .request(reqwest::Method::PATCH, collection, auth)
            .header("Prefer", "return=representation")
            .query(&query.to_params())
            .json(patch)
            .send()
            .await?;
        returned_rows(response).await
    }

    async fn delete(
        &self,
        collection: &str,
        query: &RowQuery,
        auth: Option<&str>,
    ) -> Result<usize, StoreError> {
        let response = self
            .request(reqwest::Method::DELETE, collection, auth)
            .header("Prefer", "return=representation")
            .query(&query.to_params())
            .send()
            .await?;
        returned_rows(response).await
    }

    async fn upsert(
        &self,
        collection: &str,
        key_column: &str,
        row: &Value,
        auth: Option<&str>,
    ) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::POST, collection, auth)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .query(&[("on_conflict", key_column)])
            .json(row)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}
