//! Error types for the site service.
//!
//! API handlers return [`SiteError`], rendered as `{"success": false,
//! "error": "..."}`. Page handlers return [`PageError`], rendered as an HTML
//! error page. Upstream and internal causes are logged and replaced by a
//! generic message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use maud::{DOCTYPE, html};
use serde::Serialize;

/// Site service error type.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// User input was rejected. The message is shown to the user.
    #[error("validation failed: {0}")]
    Validation(String),

    /// No signed-in identity.
    #[error("sign-in required")]
    Unauthenticated,

    /// Signed in, but not allowed to perform the action.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The remote document changed since it was read. Retryable.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The requested entry or task doesn't exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An optional collaborator (identity provider, content store) isn't
    /// configured.
    #[error("not configured: {0}")]
    NotConfigured(&'static str),

    /// GitHub, the identity provider, or the store failed.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<obsidian_log_core::Error> for SiteError {
    fn from(err: obsidian_log_core::Error) -> Self {
        match err {
            obsidian_log_core::Error::InvalidField { .. } => Self::Validation(err.user_message()),
            other => Self::Internal(other.into()),
        }
    }
}

impl SiteError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the user. Logs the cause for upstream and
    /// internal errors.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::Forbidden(msg) | Self::Conflict(msg) => msg.clone(),
            Self::Unauthenticated => "Sign-in required".to_string(),
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::NotConfigured(what) => format!("{what} is not configured"),
            Self::Upstream(err) => {
                tracing::error!(error = %err, "upstream error");
                "An upstream service failed. Please try again later.".to_string()
            }
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                "An internal error occurred. Please try again later.".to_string()
            }
        }
    }
}

/// JSON body for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            error: None,
            data: Some(data),
        })
    }
}

impl ApiResponse<()> {
    pub fn done() -> Json<Self> {
        Json(Self {
            success: true,
            error: None,
            data: None,
        })
    }
}

impl IntoResponse for SiteError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            error: Some(self.public_message()),
            data: None,
        };
        (self.status(), Json(body)).into_response()
    }
}

/// A [`SiteError`] rendered as an HTML page.
#[derive(Debug)]
pub struct PageError(pub SiteError);

impl From<SiteError> for PageError {
    fn from(err: SiteError) -> Self {
        Self(err)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        let title = match status {
            StatusCode::NOT_FOUND => "Not Found",
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => "Access Denied",
            StatusCode::BAD_REQUEST => "Bad Request",
            _ => "Something Went Wrong",
        };
        let message = self.0.public_message();

        let markup = html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    title { (title) }
                    meta name="robots" content="noindex";
                    style { (maud::PreEscaped(crate::render::components::ERROR_CSS)) }
                }
                body {
                    main class="error-page" {
                        h1 { (title) }
                        p { (message) }
                        a href="/" { "Back to home" }
                    }
                }
            }
        };

        (status, markup).into_response()
    }
}
