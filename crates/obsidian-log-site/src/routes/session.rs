//! Sign-in, sign-out and session lookup.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use obsidian_log_core::is_admin;
use serde::{Deserialize, Serialize};

use crate::auth::{bearer_token, get_session};
use crate::error::{ApiResponse, PageError, SiteError};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginQuery {
    pub redirect_to: Option<String>,
}

/// Redirect to the identity provider's GitHub sign-in.
///
/// `redirect_to` must point back into this site; anything else is replaced
/// by the home page.
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> Result<Response, PageError> {
    let Some(identity) = &state.identity else {
        return Err(SiteError::NotConfigured("Sign-in").into());
    };

    let base_url = &state.config.base_url;
    let home = format!("{base_url}/");
    let redirect_to = query
        .redirect_to
        .filter(|target| target == base_url || target.starts_with(&home))
        .unwrap_or(home);

    Ok(Redirect::to(&identity.sign_in_url(&redirect_to)).into_response())
}

/// Revoke the caller's session. Succeeds when there is nothing to revoke.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<()>>, SiteError> {
    if let (Some(identity), Some(token)) = (&state.identity, bearer_token(&headers)) {
        identity.sign_out(token).await?;
        tracing::info!("signed out");
    }
    Ok(ApiResponse::done())
}

#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: String,
    pub username: Option<String>,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionBody {
    pub user: Option<SessionUser>,
}

/// The signed-in user, if any, and whether they administer the site.
pub async fn session(State(state): State<AppState>, headers: HeaderMap) -> Json<ApiResponse<SessionBody>> {
    let user = match get_session(&state, &headers).await {
        Some(identity) => {
            let config = state.resolver().resolve().await;
            Some(SessionUser {
                is_admin: is_admin(&identity, &config),
                id: identity.id,
                username: identity.provider_username,
            })
        }
        None => None,
    };
    ApiResponse::ok(SessionBody { user })
}
