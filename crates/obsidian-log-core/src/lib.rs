//! Core types, validation, and pure logic for the Obsidian Log site.
//!
//! This crate provides:
//! - Site configuration parsing and repository URL validation
//! - Content source selection (remote mirror vs local directory)
//! - Admin membership checks
//! - URL safety filtering for links and images
//! - Link extraction and the link-card render heuristic
//! - Page metadata extraction for link previews
//! - Content entries, blog search, and the task model
//!
//! Nothing in here performs network I/O. The service crate wires these
//! pieces to GitHub, the identity provider, and the content store.

pub mod admin;
pub mod blog;
pub mod config;
pub mod entry;
mod error;
pub mod links;
pub mod markdown;
pub mod metadata;
pub mod safe_url;
pub mod source;
pub mod task;
pub mod validate;

// ═══════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════

/// Path of the site configuration document, relative to the repository root
/// (and to the local content root for the fallback file).
pub const CONFIG_PATH: &str = ".obsidian-log/config.json";

/// Site title used when the configuration leaves it empty.
pub const DEFAULT_SITE_TITLE: &str = "Obsidian Log";

/// Site subtitle used when the configuration leaves it empty.
pub const DEFAULT_SITE_SUBTITLE: &str = "A personal log of articles, scraps, and notes";

pub use admin::{Identity, is_admin};
pub use config::{AppConfig, RepoLocation, is_valid_repo_url};
pub use entry::{ContentKind, Entry};
pub use error::{Error, Result};
pub use links::LinkSpan;
pub use markdown::RenderBlock;
pub use metadata::PageMetadata;
pub use safe_url::{is_safe_for_image, is_safe_for_link};
pub use source::{ContentSourceDecision, decide};
pub use task::{Task, TaskStatus, TaskSummary, Visibility};
