//! Route definitions for the site service.
//!
//! ## Routes
//!
//! ### Pages
//! - `GET /` - Home page
//! - `GET /articles`, `GET /articles/{slug}` - Articles
//! - `GET /scraps`, `GET /scraps/{slug}` - Scraps
//! - `GET /blog`, `GET /blog/{slug}` - Blog (listing takes `?q=` and `?tag=`)
//! - `GET /tasks` - Public task board
//! - `GET /health` - Health check (JSON)
//! - `GET /robots.txt` - Crawler instructions
//!
//! ### Session
//! - `GET /auth/login?redirect_to=` - Redirect to GitHub sign-in
//! - `POST /auth/logout` - Revoke the bearer token
//! - `GET /api/session` - Current identity and admin flag
//!
//! ### API
//! - `GET /api/config` - Resolved site configuration
//! - `PUT /api/config` - Replace the configuration (admins only)
//! - `GET /api/page-metadata?url=` - Link-card title and image
//! - `GET /api/blog-assets/proxy?url=` - Images from the mirror repository
//!
//! ### Admin (bearer token of an admin required)
//! - `GET|POST /api/admin/tasks` - List or create tasks
//! - `PATCH|DELETE /api/admin/tasks/{id}` - Update or delete a task
//! - `POST /api/admin/blog` - Publish a new blog post
//! - `PUT /api/admin/blog/{slug}` - Replace a blog post

mod admin;
mod api;
mod health;
mod pages;
mod session;

use axum::Router;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post, put};

use crate::auth::require_admin;
use crate::state::AppState;

/// Build the complete site router.
pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/tasks", get(admin::list_tasks).post(admin::create_task))
        .route(
            "/tasks/{id}",
            patch(admin::update_task).delete(admin::delete_task),
        )
        .route("/blog", post(admin::create_post))
        .route("/blog/{slug}", put(admin::update_post))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        // Pages
        .route("/", get(pages::home))
        .route("/articles", get(pages::articles))
        .route("/articles/{slug}", get(pages::article))
        .route("/scraps", get(pages::scraps))
        .route("/scraps/{slug}", get(pages::scrap))
        .route("/blog", get(pages::blog))
        .route("/blog/{slug}", get(pages::blog_post))
        .route("/tasks", get(pages::tasks))
        .route("/health", get(health::health_check))
        .route("/robots.txt", get(robots_txt))
        // Session
        .route("/auth/login", get(session::login))
        .route("/auth/logout", post(session::logout))
        .route("/api/session", get(session::session))
        // API
        .route("/api/config", get(api::get_config).put(api::put_config))
        .route("/api/page-metadata", get(api::page_metadata))
        .route("/api/blog-assets/proxy", get(api::blog_asset))
        .nest("/api/admin", admin)
        .with_state(state)
}

/// Serve robots.txt. The admin API is off limits.
async fn robots_txt() -> impl IntoResponse {
    (
        [("content-type", "text/plain; charset=utf-8")],
        "User-agent: *\nAllow: /\nDisallow: /api/\n",
    )
}
