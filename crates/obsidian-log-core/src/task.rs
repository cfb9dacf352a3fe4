//! Task board model: rows, status transitions, and summary counts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, validate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Todo,
    Doing,
    Done,
}

impl TaskStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Todo => "Todo",
            Self::Doing => "Doing",
            Self::Done => "Done",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// A task row as stored in the `tasks` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub visibility: Visibility,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Parse a store row. Returns `None` if the row doesn't have the
    /// expected shape.
    pub fn from_row(row: &Value) -> Option<Self> {
        let mut row = row.clone();
        // Numeric ids are normalised to strings.
        if let Some(id) = row.get("id").and_then(Value::as_i64) {
            row["id"] = Value::String(id.to_string());
        }
        serde_json::from_value(row).ok()
    }
}

/// Counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub total: usize,
    pub done: usize,
    pub doing: usize,
    pub todo: usize,
}

impl TaskSummary {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        tasks.iter().fold(Self::default(), |mut summary, task| {
            summary.total += 1;
            match task.status {
                TaskStatus::Todo => summary.todo += 1,
                TaskStatus::Doing => summary.doing += 1,
                TaskStatus::Done => summary.done += 1,
            }
            summary
        })
    }

    /// Completed percentage, rounded down. Zero when there are no tasks.
    pub fn percent_done(&self) -> usize {
        (self.done * 100).checked_div(self.total).unwrap_or(0)
    }
}

/// Request body for creating a task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

/// A validated task ready for insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTaskRow {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub visibility: Visibility,
}

impl NewTask {
    pub fn validate(self) -> Result<NewTaskRow> {
        let title = self.title.trim().to_string();
        validate::validate_title(&title)?;

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if let Some(description) = &description {
            validate::validate_description(description)?;
        }

        Ok(NewTaskRow {
            title,
            description,
            status: TaskStatus::Todo,
            visibility: self.visibility.unwrap_or_default(),
        })
    }
}

/// Request body for updating a task. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
    pub visibility: Option<Visibility>,
}

/// Column changes sent to the store. `Some(None)` clears a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub updated_at: DateTime<Utc>,
}

impl TaskUpdate {
    /// Validate and turn into a patch.
    ///
    /// Status timestamps follow the transition from `current` (when known):
    /// entering `doing` stamps `started_at`, `done` stamps `completed_at`,
    /// and `todo` clears both.
    pub fn into_patch(self, current: Option<TaskStatus>, now: DateTime<Utc>) -> Result<TaskPatch> {
        let title = match self.title {
            Some(title) => {
                let title = title.trim().to_string();
                validate::validate_title(&title)?;
                Some(title)
            }
            None => None,
        };

        let mut patch = TaskPatch {
            title,
            status: self.status,
            visibility: self.visibility,
            started_at: None,
            completed_at: None,
            updated_at: now,
        };

        if let (Some(next), Some(current)) = (self.status, current) {
            match next {
                TaskStatus::Doing if current != TaskStatus::Doing => {
                    patch.started_at = Some(Some(now));
                }
                TaskStatus::Done => patch.completed_at = Some(Some(now)),
                TaskStatus::Todo => {
                    patch.started_at = Some(None);
                    patch.completed_at = Some(None);
                }
                TaskStatus::Doing => {}
            }
        }

        Ok(patch)
    }
}
