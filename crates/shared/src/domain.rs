use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest title accepted by the store, in characters.
pub const MAX_TITLE_CHARS: usize = 200;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);
    };
}

id_newtype!(TaskId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub is_completed: bool,
}

impl Task {
    pub fn status_glyph(&self) -> &'static str {
        if self.is_completed {
            "✅"
        } else {
            "❌"
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    pub total: u64,
    pub active: u64,
}
