//! Health check endpoint.

use axum::Json;
use axum::extract::State;
use obsidian_log_core::AppConfig;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    /// `remote` when a mirror repository is configured in the environment,
    /// `local` otherwise.
    content_source: &'static str,
    /// `owner/repo` of the environment mirror.
    #[serde(skip_serializing_if = "Option::is_none")]
    mirror: Option<String>,
    sign_in: bool,
    task_store: bool,
}

/// Service health and which collaborators are wired up.
///
/// Does no network I/O, so the repository config document is not consulted.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let source = state.content().source_for(&AppConfig::default());
    Json(HealthResponse {
        status: "ok",
        service: "obsidian-log-site",
        version: env!("CARGO_PKG_VERSION"),
        content_source: if source.use_remote { "remote" } else { "local" },
        mirror: source.remote_location.map(|location| location.to_string()),
        sign_in: state.identity.is_some(),
        task_store: state.store.is_some(),
    })
}
