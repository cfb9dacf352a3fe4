//! In-memory collaborators for tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use obsidian_log_core::{Identity, PageMetadata, RepoLocation};
use serde_json::Value;

use crate::config::Config;
use crate::error::SiteError;
use crate::github::{
    FileCommit, GithubError, MAX_ASSET_BYTES, RawAsset, RemoteEntry, RemoteFile, RepoContents,
};
use crate::identity::IdentityProvider;
use crate::page_metadata::MetadataSource;
use crate::state::AppState;
use crate::store::{ContentStore, RowQuery, StoreError};

// ============================================================================
// GitHub
// ============================================================================

/// A commit accepted by [`FakeGithub`].
#[derive(Debug, Clone)]
pub struct RecordedCommit {
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub message: String,
    pub content: String,
    pub sha: Option<String>,
    pub token: String,
}

type FileKey = (String, String, String);

/// Repository contents held in memory. Commits check the sha the way
/// GitHub does.
#[derive(Default)]
pub struct FakeGithub {
    files: Mutex<HashMap<FileKey, RemoteFile>>,
    raw: Mutex<HashMap<String, RawAsset>>,
    commits: Mutex<Vec<RecordedCommit>>,
    next_sha: AtomicUsize,
    reads: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    reject_next: AtomicBool,
    failing: bool,
}

impl FakeGithub {
    /// Every call fails with a server error.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    /// Store a file directly, bypassing commit checks.
    pub fn put(&self, owner: &str, repo: &str, path: &str, content: &str) {
        let sha = self.new_sha();
        self.files.lock().unwrap().insert(
            key(owner, repo, path),
            RemoteFile {
                sha,
                content: content.to_string(),
            },
        );
    }

    pub fn put_raw(&self, url: &str, content_type: &str, bytes: &[u8]) {
        self.raw.lock().unwrap().insert(
            url.to_string(),
            RawAsset {
                content_type: Some(content_type.to_string()),
                bytes: bytes.to_vec(),
            },
        );
    }

    pub fn file(&self, owner: &str, repo: &str, path: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(&key(owner, repo, path))
            .map(|f| f.content.clone())
    }

    pub fn last_commit(&self) -> Option<RecordedCommit> {
        self.commits.lock().unwrap().last().cloned()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Most `get_file` calls that were pending at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Make the next commit fail as if the sha were stale.
    pub fn reject_next_commit(&self) {
        self.reject_next.store(true, Ordering::SeqCst);
    }

    fn new_sha(&self) -> String {
        format!("sha{}", self.next_sha.fetch_add(1, Ordering::SeqCst))
    }

    fn check_failing(&self) -> Result<(), GithubError> {
        if self.failing {
            return Err(GithubError::Status {
                status: 500,
                body: "unavailable".into(),
            });
        }
        Ok(())
    }
}

fn key(owner: &str, repo: &str, path: &str) -> FileKey {
    (owner.to_string(), repo.to_string(), path.to_string())
}

#[async_trait]
impl RepoContents for FakeGithub {
    async fn get_file(
        &self,
        location: &RepoLocation,
        path: &str,
        _token: Option<&str>,
    ) -> Result<Option<RemoteFile>, GithubError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let pending = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(pending, Ordering::SeqCst);
        // Let sibling requests start before this one completes.
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.check_failing()?;
        Ok(self
            .files
            .lock()
            .unwrap()
            .get(&key(&location.owner, &location.repo, path))
            .cloned())
    }

    async fn list_dir(
        &self,
        location: &RepoLocation,
        path: &str,
        _token: Option<&str>,
    ) -> Result<Vec<RemoteEntry>, GithubError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let files = self.files.lock().unwrap();
        let mut entries: Vec<RemoteEntry> = files
            .keys()
            .filter(|(owner, repo, _)| *owner == location.owner && *repo == location.repo)
            .filter_map(|(_, _, file_path)| {
                let name = file_path.strip_prefix(&prefix)?;
                (!name.contains('/')).then(|| RemoteEntry {
                    name: name.to_string(),
                    path: file_path.clone(),
                    kind: "file".to_string(),
                })
            })
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    async fn put_file(
        &self,
        location: &RepoLocation,
        path: &str,
        commit: FileCommit<'_>,
    ) -> Result<(), GithubError> {
        self.check_failing()?;
        if self.reject_next.swap(false, Ordering::SeqCst) {
            return Err(GithubError::Conflict);
        }

        let file_key = key(&location.owner, &location.repo, path);
        let current_sha = self
            .files
            .lock()
            .unwrap()
            .get(&file_key)
            .map(|f| f.sha.clone());
        if current_sha.as_deref() != commit.sha {
            return Err(GithubError::Conflict);
        }

        let sha = self.new_sha();
        self.files.lock().unwrap().insert(
            file_key,
            RemoteFile {
                sha,
                content: commit.content.to_string(),
            },
        );
        self.commits.lock().unwrap().push(RecordedCommit {
            owner: location.owner.clone(),
            repo: location.repo.clone(),
            path: path.to_string(),
            message: commit.message.to_string(),
            content: commit.content.to_string(),
            sha: commit.sha.map(str::to_string),
            token: commit.token.to_string(),
        });
        Ok(())
    }

    async fn get_raw(&self, url: &str) -> Result<Option<RawAsset>, GithubError> {
        self.check_failing()?;
        let asset = self.raw.lock().unwrap().get(url).cloned();
        if asset
            .as_ref()
            .is_some_and(|a| a.bytes.len() > MAX_ASSET_BYTES)
        {
            return Err(GithubError::TooLarge);
        }
        Ok(asset)
    }
}

// ============================================================================
// Identity provider
// ============================================================================

/// Access tokens mapped to identities.
#[derive(Default)]
pub struct FakeIdentity {
    users: HashMap<String, Identity>,
    signed_out: Mutex<Vec<String>>,
}

impl FakeIdentity {
    pub fn with_user(mut self, token: &str, id: &str, username: Option<&str>) -> Self {
        self.users.insert(
            token.to_string(),
            Identity {
                id: id.to_string(),
                provider_username: username.map(str::to_string),
            },
        );
        self
    }

    pub fn signed_out(&self) -> Vec<String> {
        self.signed_out.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn sign_in_url(&self, redirect_to: &str) -> String {
        format!("https://auth.test/authorize?redirect_to={redirect_to}")
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), SiteError> {
        self.signed_out.lock().unwrap().push(access_token.to_string());
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Option<Identity> {
        self.users.get(access_token).cloned()
    }
}

// ============================================================================
// Content store
// ============================================================================

/// Collections of JSON rows. Inserted rows get an id and timestamps the way
/// column defaults would fill them.
#[derive(Default)]
pub struct FakeStore {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    next_id: AtomicUsize,
    failing: bool,
}

impl FakeStore {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn seed(&self, collection: &str, rows: Vec<Value>) {
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .extend(rows);
    }

    pub fn rows(&self, collection: &str) -> Vec<Value> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn check_failing(&self) -> Result<(), StoreError> {
        if self.failing {
            return Err(StoreError::Status {
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(())
    }
}

fn column_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn row_matches(row: &Value, query: &RowQuery) -> bool {
    query
        .filters
        .iter()
        .all(|(column, value)| column_text(row, column).as_deref() == Some(value.as_str()))
}

fn merge(row: &mut Value, patch: &Value) {
    if let (Some(row), Some(patch)) = (row.as_object_mut(), patch.as_object()) {
        for (k, v) in patch {
            row.insert(k.clone(), v.clone());
        }
    }
}

#[async_trait]
impl ContentStore for FakeStore {
    async fn select(
        &self,
        collection: &str,
        query: &RowQuery,
        _auth: Option<&str>,
    ) -> Result<Vec<Value>, StoreError> {
        self.check_failing()?;
        let mut rows: Vec<Value> = self
            .rows(collection)
            .into_iter()
            .filter(|row| row_matches(row, query))
            .collect();
        if let Some((column, descending)) = &query.order {
            rows.sort_by_key(|row| column_text(row, column));
            if *descending {
                rows.reverse();
            }
        }
        Ok(rows)
    }

    async fn insert(
        &self,
        collection: &str,
        row: &Value,
        _auth: Option<&str>,
    ) -> Result<(), StoreError> {
        self.check_failing()?;
        let mut row = row.clone();
        if let Some(obj) = row.as_object_mut() {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let now = Value::String(Utc::now().to_rfc3339());
            obj.entry("id").or_insert_with(|| Value::String(format!("new-{id}")));
            obj.entry("created_at").or_insert_with(|| now.clone());
            obj.entry("updated_at").or_insert(now);
        }
        self.seed(collection, vec![row]);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        query: &RowQuery,
        patch: &Value,
        _auth: Option<&str>,
    ) -> Result<usize, StoreError> {
        self.check_failing()?;
        let mut collections = self.collections.lock().unwrap();
        let rows = collections.entry(collection.to_string()).or_default();
        let mut changed = 0;
        for row in rows.iter_mut().filter(|row| row_matches(row, query)) {
            merge(row, patch);
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete(
        &self,
        collection: &str,
        query: &RowQuery,
        _auth: Option<&str>,
    ) -> Result<usize, StoreError> {
        self.check_failing()?;
        let mut collections = self.collections.lock().unwrap();
        let rows = collections.entry(collection.to_string()).or_default();
        let before = rows.len();
        rows.retain(|row| !row_matches(row, query));
        Ok(before - rows.len())
    }

    async fn upsert(
        &self,
        collection: &str,
        key_column: &str,
        row: &Value,
        _auth: Option<&str>,
    ) -> Result<(), StoreError> {
        self.check_failing()?;
        let key = column_text(row, key_column);
        let mut collections = self.collections.lock().unwrap();
        let rows = collections.entry(collection.to_string()).or_default();
        match rows
            .iter_mut()
            .find(|existing| key.is_some() && column_text(existing, key_column) == key)
        {
            Some(existing) => merge(existing, row),
            None => rows.push(row.clone()),
        }
        Ok(())
    }
}

// ============================================================================
// Page metadata
// ============================================================================

/// Canned metadata per URL; unknown URLs yield nothing.
#[derive(Default)]
pub struct FakeMetadata {
    pages: HashMap<String, PageMetadata>,
}

impl FakeMetadata {
    pub fn with_page(mut self, url: &str, title: Option<&str>, image: Option<&str>) -> Self {
        self.pages.insert(
            url.to_string(),
            PageMetadata {
                title: title.map(str::to_string),
                image: image.map(str::to_string),
            },
        );
        self
    }
}

#[async_trait]
impl MetadataSource for FakeMetadata {
    async fn fetch(&self, url: &str) -> PageMetadata {
        self.pages.get(url).cloned().unwrap_or_default()
    }
}

// ============================================================================
// Application state
// ============================================================================

pub fn test_config(content_dir: &Path, github_repo_url: &str) -> Config {
    Config {
        bind_addr: "127.0.0.1:0".into(),
        base_url: "http://localhost:3000".into(),
        content_dir: content_dir.to_path_buf(),
        github_repo_url: github_repo_url.into(),
        github_token: Some("env-token".into()),
        github_api_url: "https://api.github.test".into(),
        supabase: None,
    }
}

pub fn test_state(
    config: Config,
    github: Arc<FakeGithub>,
    identity: Option<Arc<FakeIdentity>>,
    store: Option<Arc<FakeStore>>,
) -> AppState {
    AppState {
        config: Arc::new(config),
        github,
        identity: identity.map(|i| i as Arc<dyn IdentityProvider>),
        store: store.map(|s| s as Arc<dyn ContentStore>),
        metadata: Arc::new(FakeMetadata::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn fake_store_filters_orders_and_counts() {
        let store = FakeStore::default();
        store.seed(
            "tasks",
            vec![
                json!({"id": 1, "v": "a", "t": "2024-01-01"}),
                json!({"id": 2, "v": "b", "t": "2024-03-01"}),
                json!({"id": 3, "v": "a", "t": "2024-02-01"}),
            ],
        );

        let rows = store
            .select("tasks", &RowQuery::new().eq("v", "a").order_by("t", true), None)
            .await
            .unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(3), json!(1)]);

        let changed = store
            .update("tasks", &RowQuery::new().eq("id", "2"), &json!({"v": "c"}), None)
            .await
            .unwrap();
        assert_eq!(changed, 1);

        store
            .upsert("tasks", "id", &json!({"id": 2, "v": "d"}), None)
            .await
            .unwrap();
        assert_eq!(store.rows("tasks").len(), 3);
        assert_eq!(store.rows("tasks")[1]["v"], "d");
    }

    fn commit(sha: Option<&str>) -> FileCommit<'_> {
        FileCommit {
            content: "x",
            message: "m",
            sha,
            token: "t",
        }
    }

    #[tokio::test]
    async fn fake_github_checks_sha() {
        let github = FakeGithub::default();
        let location = RepoLocation {
            owner: "o".into(),
            repo: "r".into(),
        };
        github.put_file(&location, "a.md", commit(None)).await.unwrap();
        assert!(matches!(
            github.put_file(&location, "a.md", commit(None)).await,
            Err(GithubError::Conflict)
        ));
        let sha = github.get_file(&location, "a.md", None).await.unwrap().unwrap().sha;
        github
            .put_file(&location, "a.md", commit(Some(&sha)))
            .await
            .unwrap();
    }
}
