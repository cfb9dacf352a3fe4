//! Typed task operations over the content store.

use chrono::Utc;
use obsidian_log_core::task::{NewTask, TaskUpdate};
use obsidian_log_core::{Task, TaskStatus};
use serde_json::Value;

use crate::error::SiteError;
use crate::store::{ContentStore, RowQuery};

const TASKS: &str = "tasks";

/// Parse store rows into tasks, skipping rows with an unexpected shape.
pub fn parse_rows(rows: Vec<Value>) -> Vec<Task> {
    rows.iter()
        .filter_map(|row| {
            let task = Task::from_row(row);
            if task.is_none() {
                tracing::warn!(row = %row, "skipping malformed task row");
            }
            task
        })
        .collect()
}

/// Task board backed by a [`ContentStore`].
pub struct TaskBoard<'a> {
    store: &'a dyn ContentStore,
}

impl<'a> TaskBoard<'a> {
    pub fn new(store: &'a dyn ContentStore) -> Self {
        Self { store }
    }

    /// Public tasks, newest first. Store failures yield an empty list.
    pub async fn public_tasks(&self) -> Vec<Task> {
        let query = RowQuery::new()
            .eq("visibility", "public")
            .order_by("created_at", true);
        match self.store.select(TASKS, &query, None).await {
            Ok(rows) => parse_rows(rows),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load public tasks");
                Vec::new()
            }
        }
    }

    /// All tasks, newest first, as seen by the signed-in admin.
    pub async fn all_tasks(&self, auth: &str) -> Result<Vec<Task>, SiteError> {
        let query = RowQuery::new().order_by("created_at", true);
        let rows = self.store.select(TASKS, &query, Some(auth)).await?;
        Ok(parse_rows(rows))
    }

    pub async fn create(&self, input: NewTask, auth: &str) -> Result<(), SiteError> {
        let row = input.validate()?;
        let row = serde_json::to_value(&row).map_err(anyhow::Error::from)?;
        self.store.insert(TASKS, &row, Some(auth)).await?;
        tracing::info!("task created");
        Ok(())
    }

    pub async fn update(&self, id: &str, update: TaskUpdate, auth: &str) -> Result<(), SiteError> {
        let by_id = RowQuery::new().eq("id", id);

        let current = match update.status {
            Some(_) => self.current_status(&by_id, auth).await?,
            None => None,
        };

        let patch = update.into_patch(current, Utc::now())?;
        let patch = serde_json::to_value(&patch).map_err(anyhow::Error::from)?;

        let changed = self.store.update(TASKS, &by_id, &patch, Some(auth)).await?;
        if changed == 0 {
            return Err(SiteError::NotFound(format!("task {id}")));
        }
        tracing::info!(task_id = %id, "task updated");
        Ok(())
    }

    pub async fn delete(&self, id: &str, auth: &str) -> Result<(), SiteError> {
        let removed = self
            .store
            .delete(TASKS, &RowQuery::new().eq("id", id), Some(auth))
            .await?;
        if removed == 0 {
            return Err(SiteError::NotFound(format!("task {id}")));
        }
        tracing::info!(task_id = %id, "task deleted");
        Ok(())
    }

    async fn current_status(&self, by_id: &RowQuery, auth: &str) -> Result<Option<TaskStatus>, SiteError> {
        let rows = self.store.select(TASKS, by_id, Some(auth)).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("status"))
            .and_then(|status| serde_json::from_value(status.clone()).ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeStore;
    use obsidian_log_core::Visibility;
    use serde_json::json;

    fn row(id: &str, status: &str, visibility: &str, created_at: &str) -> Value {
        json!({
            "id": id,
            "title": format!("task {id}"),
            "description": null,
            "status": status,
            "visibility": visibility,
            "started_at": null,
            "completed_at": null,
            "created_at": created_at,
            "updated_at": created_at,
        })
    }

    fn seeded() -> FakeStore {
        let store = FakeStore::default();
        store.seed(
            "tasks",
            vec![
                row("1", "todo", "public", "2024-01-01T00:00:00Z"),
                row("2", "doing", "private", "2024-02-01T00:00:00Z"),
                row("3", "done", "public", "2024-03-01T00:00:00Z"),
                json!({ "id": "broken" }),
            ],
        );
        store
    }

    #[tokio::test]
    async fn public_tasks_filtered_and_sorted() {
        let store = seeded();
        let board = TaskBoard::new(&store);
        let tasks = board.public_tasks().await;
        let ids: Vec<_> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
    }

    #[tokio::test]
    async fn all_tasks_skips_malformed() {
        let store = seeded();
        let tasks = TaskBoard::new(&store).all_tasks("token").await.unwrap();
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].id, "3");
    }

    #[tokio::test]
    async fn create_validates_before_insert() {
        let store = FakeStore::default();
        let board = TaskBoard::new(&store);

        let err = board
            .create(
                NewTask {
                    title: "  ".into(),
                    ..Default::default()
                },
                "token",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SiteError::Validation(_)));
        assert!(store.rows("tasks").is_empty());

        board
            .create(
                NewTask {
                    title: "Write docs".into(),
                    description: None,
                    visibility: Some(Visibility::Private),
                },
                "token",
            )
            .await
            .unwrap();
        let rows = store.rows("tasks");
        assert_eq!(rows[0]["title"], "Write docs");
        assert_eq!(rows[0]["status"], "todo");
        assert_eq!(rows[0]["visibility"], "private");
    }

    #[tokio::test]
    async fn update_status_stamps_started_at() {
        let store = seeded();
        let board = TaskBoard::new(&store);
        board
            .update(
                "1",
                TaskUpdate {
                    status: Some(TaskStatus::Doing),
                    ..Default::default()
                },
                "token",
            )
            .await
            .unwrap();

        let rows = store.rows("tasks");
        let updated = rows.iter().find(|r| r["id"] == "1").unwrap();
        assert_eq!(updated["status"], "doing");
        assert!(updated["started_at"].is_string());
    }

    #[tokio::test]
    async fn update_to_todo_clears_timestamps() {
        let store = seeded();
        let board = TaskBoard::new(&store);
        board
            .update(
                "3",
                TaskUpdate {
                    status: Some(TaskStatus::Todo),
                    ..Default::default()
                },
                "token",
            )
            .await
            .unwrap();
        let rows = store.rows("tasks");
        let updated = rows.iter().find(|r| r["id"] == "3").unwrap();
        assert!(updated["started_at"].is_null());
        assert!(updated["completed_at"].is_null());
    }

    #[tokio::test]
    async fn update_missing_task_is_not_found() {
        let store = seeded();
        let err = TaskBoard::new(&store)
            .update(
                "nope",
                TaskUpdate {
                    title: Some("New".into()),
                    ..Default::default()
                },
                "token",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SiteError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_task() {
        let store = seeded();
        let board = TaskBoard::new(&store);
        board.delete("2", "token").await.unwrap();
        assert!(store.rows("tasks").iter().all(|r| r["id"] != "2"));
        assert!(matches!(
            board.delete("2", "token").await,
            Err(SiteError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn store_failure_is_upstream() {
        let store = FakeStore::failing();
        let board = TaskBoard::new(&store);
        assert!(board.public_tasks().await.is_empty());
        assert!(matches!(
            board.all_tasks("token").await,
            Err(SiteError::Upstream(_))
        ));
    }
}
