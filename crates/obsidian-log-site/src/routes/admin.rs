//! Admin API: task board and blog authoring.
//!
//! Every handler here sits behind [`require_admin`](crate::auth::require_admin)
//! and receives the caller's [`AdminSession`].

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::{SecondsFormat, Utc};
use obsidian_log_core::blog::BlogDraft;
use obsidian_log_core::task::{NewTask, TaskUpdate};
use obsidian_log_core::{ContentKind, Entry, RepoLocation, Task, TaskSummary};
use serde::Serialize;

use crate::auth::AdminSession;
use crate::error::{ApiResponse, SiteError};
use crate::github::FileCommit;
use crate::state::AppState;
use crate::tasks::TaskBoard;

fn board(state: &AppState) -> Result<TaskBoard<'_>, SiteError> {
    state.tasks().ok_or(SiteError::NotConfigured("Task store"))
}

#[derive(Debug, Serialize)]
pub struct TasksBody {
    pub tasks: Vec<Task>,
    pub summary: TaskSummary,
}

/// Every task, private ones included.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
) -> Result<Json<ApiResponse<TasksBody>>, SiteError> {
    let tasks = board(&state)?.all_tasks(&session.access_token).await?;
    let summary = TaskSummary::from_tasks(&tasks);
    Ok(ApiResponse::ok(TasksBody { tasks, summary }))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Json(input): Json<NewTask>,
) -> Result<Json<ApiResponse<()>>, SiteError> {
    board(&state)?.create(input, &session.access_token).await?;
    Ok(ApiResponse::done())
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Path(id): Path<String>,
    Json(update): Json<TaskUpdate>,
) -> Result<Json<ApiResponse<()>>, SiteError> {
    board(&state)?
        .update(&id, update, &session.access_token)
        .await?;
    Ok(ApiResponse::done())
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, SiteError> {
    board(&state)?.delete(&id, &session.access_token).await?;
    Ok(ApiResponse::done())
}

#[derive(Debug, Serialize)]
pub struct PostBody {
    pub slug: String,
}

/// Where and with which credential blog posts are committed.
fn blog_target<'a>(
    state: &'a AppState,
    session: &'a AdminSession,
) -> Result<(RepoLocation, &'a str), SiteError> {
    let location = state
        .content()
        .write_location(&session.config)
        .ok_or_else(|| {
            SiteError::Validation("A GitHub repository must be configured to publish posts".into())
        })?;
    let token = session
        .provider_token
        .as_deref()
        .or(state.config.github_token.as_deref())
        .ok_or_else(|| SiteError::Validation("A GitHub token is required to publish posts".into()))?;
    Ok((location, token))
}

fn post_path(slug: &str) -> String {
    format!("{}/{slug}.md", ContentKind::Blog.dir())
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Publish a new post. Fails with a conflict if the slug is taken.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Json(draft): Json<BlogDraft>,
) -> Result<Json<ApiResponse<PostBody>>, SiteError> {
    let entry = draft.into_entry(None, now())?;
    let (location, token) = blog_target(&state, &session)?;
    let path = post_path(&entry.slug);

    if state.github.get_file(&location, &path, Some(token)).await?.is_some() {
        return Err(SiteError::Conflict(format!(
            "A post with the slug \"{}\" already exists",
            entry.slug
        )));
    }

    let document = entry.to_markdown()?;
    let message = format!("chore: add blog post {}", entry.slug);
    state
        .github
        .put_file(
            &location,
            &path,
            FileCommit {
                content: &document,
                message: &message,
                sha: None,
                token,
            },
        )
        .await?;

    tracing::info!(repo = %location, slug = %entry.slug, user = %session.identity.id, "blog post created");
    Ok(ApiResponse::ok(PostBody { slug: entry.slug }))
}

/// Replace an existing post, keeping its creation date.
pub async fn update_post(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Path(slug): Path<String>,
    Json(draft): Json<BlogDraft>,
) -> Result<Json<ApiResponse<PostBody>>, SiteError> {
    let (location, token) = blog_target(&state, &session)?;
    obsidian_log_core::validate::validate_slug(&slug)?;
    let path = post_path(&slug);

    let Some(current) = state.github.get_file(&location, &path, Some(token)).await? else {
        return Err(SiteError::NotFound(format!("blog/{slug}")));
    };

    let created_at = Entry::parse(ContentKind::Blog, &slug, &current.content)
        .ok()
        .and_then(|existing| existing.created_at)
        .unwrap_or_else(now);

    let mut entry = draft.into_entry(Some(&slug), created_at)?;
    entry.updated_at = Some(now());

    let document = entry.to_markdown()?;
    let message = format!("chore: update blog post {slug}");
    state
        .github
        .put_file(
            &location,
            &path,
            FileCommit {
                content: &document,
                message: &message,
                sha: Some(&current.sha),
                token,
            },
        )
        .await?;

    tracing::info!(repo = %location, slug = %slug, user = %session.identity.id, "blog post updated");
    Ok(ApiResponse::ok(PostBody { slug }))
}
