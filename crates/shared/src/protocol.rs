use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Task, TaskId};

/// A user action delivered by the view layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Add { title: String },
    Delete { id: TaskId },
    Toggle { id: TaskId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: TaskId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub is_completed: bool,
    pub status: String,
}

impl From<Task> for TaskRow {
    fn from(task: Task) -> Self {
        let status = task.status_glyph().to_string();
        Self {
            id: task.id,
            title: task.title,
            created_at: task.created_at,
            is_completed: task.is_completed,
            status,
        }
    }
}

/// Fully rebuilt view emitted after every event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    pub rows: Vec<TaskRow>,
    /// Contents of the title input after the event; always cleared.
    pub input: String,
    pub total: u64,
    pub active: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ViewNotice {
    TasksChanged { total: u64, active: u64 },
}
