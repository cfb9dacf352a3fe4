//! JSON API: site configuration, link-card metadata and the blog asset proxy.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use obsidian_log_core::{AppConfig, PageMetadata, RepoLocation, is_safe_for_link};
use serde::{Deserialize, Serialize};

use crate::auth::{get_session, provider_token};
use crate::error::{ApiResponse, SiteError};
use crate::resolver::ConfigUpdate;
use crate::state::AppState;

const RAW_GITHUB_HOST: &str = "raw.githubusercontent.com";

/// Browser cache lifetime for proxied assets.
const ASSET_MAX_AGE_SECS: u32 = 3600;

const ASSET_CSP: &str = "default-src 'none'; style-src 'unsafe-inline'; sandbox";

#[derive(Debug, Serialize)]
pub struct ConfigBody {
    pub config: AppConfig,
}

pub async fn get_config(State(state): State<AppState>) -> Json<ApiResponse<ConfigBody>> {
    let config = state.resolver().resolve().await;
    ApiResponse::ok(ConfigBody { config })
}

/// Replace the site configuration. Admins only.
pub async fn put_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(candidate): Json<ConfigUpdate>,
) -> Result<Json<ApiResponse<ConfigBody>>, SiteError> {
    let actor = get_session(&state, &headers).await;
    let config = state
        .resolver()
        .update(candidate, actor.as_ref(), provider_token(&headers))
        .await?;
    Ok(ApiResponse::ok(ConfigBody { config }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UrlQuery {
    pub url: String,
}

/// Title and image for a link card.
pub async fn page_metadata(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<ApiResponse<PageMetadata>>, SiteError> {
    let url = query.url.trim();
    if !is_safe_for_link(url) {
        return Err(SiteError::Validation("A valid http(s) URL is required".into()));
    }
    Ok(ApiResponse::ok(state.metadata.fetch(url).await))
}

/// The `{owner}/{repo}` a raw content URL points into, if it is an https
/// `raw.githubusercontent.com` URL.
fn raw_github_repo(url: &str) -> Option<(String, String)> {
    let parsed = url::Url::parse(url).ok()?;
    if parsed.scheme() != "https" || parsed.host_str() != Some(RAW_GITHUB_HOST) {
        return None;
    }
    let mut segments = parsed.path_segments()?;
    let owner = segments.next().filter(|s| !s.is_empty())?;
    let repo = segments.next().filter(|s| !s.is_empty())?;
    Some((owner.to_string(), repo.to_string()))
}

fn is_mirror(location: &RepoLocation, owner: &str, repo: &str) -> bool {
    location.owner.eq_ignore_ascii_case(owner) && location.repo.eq_ignore_ascii_case(repo)
}

/// Serve an image from the mirror repository on `raw.githubusercontent.com`
/// with the server's credential, so posts in a private mirror can show their
/// images. Files of any other repository are refused.
pub async fn blog_asset(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Response, SiteError> {
    let url = query.url.trim();
    let Some((owner, repo)) = raw_github_repo(url) else {
        return Err(SiteError::Validation(
            "Only raw.githubusercontent.com assets can be proxied".into(),
        ));
    };

    let config = state.resolver().resolve().await;
    let mirror = state.content().source_for(&config).remote_location;
    if !mirror.is_some_and(|location| is_mirror(&location, &owner, &repo)) {
        tracing::info!(owner = %owner, repo = %repo, "refused asset outside the mirror");
        return Err(SiteError::Validation(
            "Only assets from the site's repository can be proxied".into(),
        ));
    }

    let Some(asset) = state.github.get_raw(url).await? else {
        return Err(SiteError::NotFound("asset".into()));
    };

    let content_type = asset
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    // SVGs are documents; keep them inert when opened directly.
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(ASSET_CSP),
    );
    if let Ok(val) = HeaderValue::from_str(&format!("public, max-age={ASSET_MAX_AGE_SECS}")) {
        headers.insert(header::CACHE_CONTROL, val);
    }

    Ok((StatusCode::OK, headers, asset.bytes).into_response())
}
