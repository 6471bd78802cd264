//! Staff task tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, DatabaseError, ValidationError};
use crate::store::{Database, DocumentKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

/// A staff task, optionally assigned and shift-scoped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub shift: Option<String>,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DocumentKind for Task {
    const DOC_TYPE: &'static str = "task";

    fn doc_id(&self) -> &str {
        &self.id
    }
}

/// Immutable task action record (currently only nudges).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEvent {
    pub id: String,
    pub task_id: String,
    pub action: String,
    pub at: DateTime<Utc>,
}

impl DocumentKind for TaskEvent {
    const DOC_TYPE: &'static str = "task_event";

    fn doc_id(&self) -> &str {
        &self.id
    }
}

impl Task {
    pub fn new(
        title: &str,
        assignee: Option<String>,
        shift: Option<String>,
        due_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if title.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "title".to_string(),
                message: "title is required".to_string(),
            });
        }
        Ok(Self {
            id: format!("task:{}", Uuid::new_v4()),
            title: title.trim().to_string(),
            status: TaskStatus::Open,
            assignee,
            shift,
            due_at,
            created_at: now,
        })
    }

    /// A task is overdue once its due time has passed and it is not done.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_at {
            Some(due) => due < now && self.status != TaskStatus::Done,
            None => false,
        }
    }
}

/// Move a task to a new status.
pub fn set_status(db: &Database, task_id: &str, status: TaskStatus) -> Result<Task, CoreError> {
    let Some((mut task, revision)) = db.load::<Task>(task_id)? else {
        return Err(DatabaseError::NotFound {
            id: task_id.to_string(),
        }
        .into());
    };
    task.status = status;
    db.update(&task, revision)?;
    Ok(task)
}

/// Record a nudge for a task (an immutable event; the task is unchanged).
pub fn nudge(db: &Database, task_id: &str, now: DateTime<Utc>) -> Result<TaskEvent, CoreError> {
    if db.load::<Task>(task_id)?.is_none() {
        return Err(DatabaseError::NotFound {
            id: task_id.to_string(),
        }
        .into());
    }
    let event = TaskEvent {
        id: format!("task_event:{task_id}:{}", Uuid::new_v4()),
        task_id: task_id.to_string(),
        action: "nudge".to_string(),
        at: now,
    };
    db.insert(&event)?;
    Ok(event)
}
