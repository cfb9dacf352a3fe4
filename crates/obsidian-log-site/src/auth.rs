//! Session lookup and the admin gate.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use obsidian_log_core::{AppConfig, Identity, is_admin};

use crate::error::SiteError;
use crate::state::AppState;

/// Header carrying the GitHub OAuth token issued at sign-in.
pub const PROVIDER_TOKEN_HEADER: &str = "x-provider-token";

/// The token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The caller-supplied GitHub token, if any.
pub fn provider_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(PROVIDER_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The identity behind the request's bearer token.
pub async fn get_session(state: &AppState, headers: &HeaderMap) -> Option<Identity> {
    let token = bearer_token(headers)?;
    let identity = state.identity.as_ref()?;
    identity.get_user(token).await
}

/// Decide whether `actor` may mutate site configuration and content under
/// `config`.
pub fn admin_gate(actor: Option<&Identity>, config: &AppConfig) -> Result<(), SiteError> {
    let actor = actor.ok_or(SiteError::Unauthenticated)?;

    if actor.provider_username.is_none() {
        return Err(SiteError::Forbidden(
            "Your GitHub username could not be determined".to_string(),
        ));
    }

    if !is_admin(actor, config) {
        tracing::info!(user_id = %actor.id, "admin access denied");
        return Err(SiteError::Forbidden(
            "Admin privileges are required".to_string(),
        ));
    }

    Ok(())
}

/// Request extension set by [`require_admin`].
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub identity: Identity,
    pub access_token: String,
    pub provider_token: Option<String>,
    /// The configuration the admin check ran against.
    pub config: AppConfig,
}

/// Middleware that admits only signed-in admins and attaches an
/// [`AdminSession`] to the request.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, SiteError> {
    let (access_token, provider_token) = {
        let headers = request.headers();
        let Some(access_token) = bearer_token(headers).map(str::to_string) else {
            tracing::debug!("missing or malformed authorization header");
            return Err(SiteError::Unauthenticated);
        };
        (access_token, provider_token(headers).map(str::to_string))
    };

    let Some(provider) = &state.identity else {
        return Err(SiteError::NotConfigured("Sign-in"));
    };
    let identity = provider.get_user(&access_token).await;

    let config = state.resolver().resolve().await;
    admin_gate(identity.as_ref(), &config)?;

    let Some(identity) = identity else {
        return Err(SiteError::Unauthenticated);
    };

    request.extensions_mut().insert(AdminSession {
        identity,
        access_token,
        provider_token,
        config,
    });

    Ok(next.run(request).await)
}
