//! Obsidian Log site server.
//!
//! Serves article, scrap, blog and task pages rendered with maud, plus a small
//! JSON API for the admin surface. Content and site configuration are
//! mirrored from a GitHub repository when one is configured, with a local
//! content directory as fallback.
//!
//! ## Routes
//!
//! - `GET /` - Home page with recent entries
//! - `GET /articles`, `GET /scraps`, `GET /blog` - Listings (blog supports `?q=` and `?tag=`)
//! - `GET /articles/{slug}`, `GET /scraps/{slug}`, `GET /blog/{slug}` - Entry pages
//! - `GET /tasks` - Public task board
//! - `GET /auth/login`, `POST /auth/logout` - Sign-in via the identity provider
//! - `GET|PUT /api/config` - Site configuration (writes require an admin)
//! - `GET /api/session` - Current identity and admin flag
//! - `GET /api/page-metadata?url=` - Link-card metadata
//! - `GET /api/blog-assets/proxy?url=` - Mirror repository images
//! - `/api/admin/*` - Task and blog administration
//! - `GET /health` - Health check (JSON)

pub mod auth;
pub mod config;
pub mod content;
pub mod error;
pub mod github;
pub mod identity;
pub mod page_metadata;
pub mod render;
pub mod resolver;
pub mod routes;
pub mod state;
pub mod store;
pub mod tasks;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use routes::router;
pub use state::AppState;
