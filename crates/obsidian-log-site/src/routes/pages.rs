//! HTML page handlers.
//!
//! Every page resolves the site configuration fresh, so edits made through
//! the admin API show up on the next request.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::future::join_all;
use obsidian_log_core::blog::{all_tags, has_tag, matches_search};
use obsidian_log_core::{ContentKind, TaskSummary};
use serde::Deserialize;

use crate::error::{PageError, SiteError};
use crate::render::{self, pages::BlogFilter};
use crate::state::AppState;

/// Browser cache lifetime for pages. Short, since content follows the mirror.
const PAGE_MAX_AGE_SECS: u32 = 60;

pub async fn home(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let config = state.resolver().resolve().await;
    let loader = state.content();

    let lists = join_all(ContentKind::ALL.map(|kind| loader.list(&config, kind))).await;
    let sections: Vec<_> = ContentKind::ALL.into_iter().zip(lists).collect();

    let canonical = format!("{}/", state.config.base_url);
    let markup = render::pages::home(&config, &sections, &canonical);
    build_response(markup.into_string(), &headers)
}

pub async fn articles(State(state): State<AppState>, headers: HeaderMap) -> Response {
    list_page(&state, ContentKind::Article, &headers).await
}

pub async fn scraps(State(state): State<AppState>, headers: HeaderMap) -> Response {
    list_page(&state, ContentKind::Scrap, &headers).await
}

/// Blog listing query: free-text search and a tag filter.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BlogQuery {
    pub q: String,
    pub tag: String,
}

pub async fn blog(
    State(state): State<AppState>,
    Query(query): Query<BlogQuery>,
    headers: HeaderMap,
) -> Response {
    let config = state.resolver().resolve().await;
    let posts = state.content().list(&config, ContentKind::Blog).await;

    let tags = all_tags(&posts);
    let query_text = query.q.trim();
    let tag = query.tag.trim();
    let matching: Vec<_> = posts
        .into_iter()
        .filter(|post| has_tag(post, tag) && matches_search(post, query_text))
        .collect();

    let filter = BlogFilter {
        query: query_text,
        tag,
        tags: &tags,
    };
    let canonical = format!("{}{}", state.config.base_url, ContentKind::Blog.route());
    let markup = render::pages::entry_list(
        &config,
        ContentKind::Blog,
        &matching,
        &canonical,
        Some(filter),
    );
    build_response(markup.into_string(), &headers)
}

pub async fn article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    detail_page(&state, ContentKind::Article, &slug, &headers).await
}

pub async fn scrap(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    detail_page(&state, ContentKind::Scrap, &slug, &headers).await
}

pub async fn blog_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    detail_page(&state, ContentKind::Blog, &slug, &headers).await
}

pub async fn tasks(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let config = state.resolver().resolve().await;
    let tasks = match state.tasks() {
        Some(board) => board.public_tasks().await,
        None => Vec::new(),
    };
    let summary = TaskSummary::from_tasks(&tasks);

    let canonical = format!("{}/tasks", state.config.base_url);
    let markup = render::pages::tasks(&config, &tasks, &summary, &canonical);
    build_response(markup.into_string(), &headers)
}

async fn list_page(state: &AppState, kind: ContentKind, headers: &HeaderMap) -> Response {
    let config = state.resolver().resolve().await;
    let entries = state.content().list(&config, kind).await;

    let canonical = format!("{}{}", state.config.base_url, kind.route());
    let markup = render::pages::entry_list(&config, kind, &entries, &canonical, None);
    build_response(markup.into_string(), headers)
}

async fn detail_page(
    state: &AppState,
    kind: ContentKind,
    slug: &str,
    headers: &HeaderMap,
) -> Result<Response, PageError> {
    let config = state.resolver().resolve().await;
    let Some(entry) = state.content().get(&config, kind, slug).await else {
        return Err(SiteError::NotFound(format!("{}/{slug}", kind.dir())).into());
    };

    let content = render::markdown::render_document(&entry.body, state.metadata.as_ref()).await;
    let canonical = format!("{}{}/{}", state.config.base_url, kind.route(), entry.slug);
    let markup = render::pages::entry_detail(&config, &entry, content, &canonical);
    Ok(build_response(markup.into_string(), headers))
}

/// Build an HTML response with security headers and an ETag.
///
/// Answers `304 Not Modified` when the request's `If-None-Match` matches.
pub fn build_response(html: String, request_headers: &HeaderMap) -> Response {
    let hash = xxhash_rust::xxh3::xxh3_64(html.as_bytes());
    let etag = format!("\"{}\"", hex_fmt::HexFmt(&hash.to_be_bytes()));

    let mut headers = HeaderMap::new();
    if let Ok(val) = HeaderValue::from_str(&etag) {
        headers.insert(header::ETAG, val);
    }
    if let Ok(val) = HeaderValue::from_str(&format!("public, max-age={PAGE_MAX_AGE_SECS}")) {
        headers.insert(header::CACHE_CONTROL, val);
    }

    let not_modified = request_headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|tag| tag.trim() == etag));
    if not_modified {
        return (StatusCode::NOT_MODIFIED, headers).into_response();
    }

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(render::components::CSP_HEADER),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));

    (StatusCode::OK, headers, html).into_response()
}
