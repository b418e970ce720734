use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{Task, TaskCounts, TaskId};

/// Handle to the task database. Cloning shares the underlying pool.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        let storage = Self { pool };
        storage.ensure_tasks_table().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn ensure_tasks_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id           INTEGER PRIMARY KEY,
                title        TEXT NOT NULL,
                created_at   TEXT NOT NULL,
                is_completed BOOLEAN NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure tasks table exists")?;
        Ok(())
    }

    pub async fn list_all(&self) -> Result<Vec<Task>> {
        let rows = sqlx::query(
            "SELECT id, title, created_at, is_completed FROM tasks ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(task_from_row).collect())
    }

    pub async fn list_active(&self) -> Result<Vec<Task>> {
        let rows = sqlx::query(
            "SELECT id, title, created_at, is_completed
             FROM tasks
             WHERE is_completed = 0
             ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(task_from_row).collect())
    }

    pub async fn get(&self, id: TaskId) -> Result<Option<Task>> {
        let row = sqlx::query("SELECT id, title, created_at, is_completed FROM tasks WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(task_from_row))
    }

    /// Inserts a new, not yet completed task with the title exactly as given.
    /// Blank or whitespace-only titles are skipped and yield `None`.
    pub async fn add(&self, title: &str) -> Result<Option<TaskId>> {
        if title.trim().is_empty() {
            return Ok(None);
        }

        let rec = sqlx::query(
            "INSERT INTO tasks (title, created_at, is_completed) VALUES (?, ?, 0) RETURNING id",
        )
        .bind(title)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(Some(TaskId(rec.get::<i64, _>(0))))
    }

    /// Returns whether a row was removed.
    pub async fn delete(&self, id: TaskId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flips `is_completed` in a single statement. Returns whether the task
    /// exists.
    pub async fn toggle_status(&self, id: TaskId) -> Result<bool> {
        let result = sqlx::query("UPDATE tasks SET is_completed = NOT is_completed WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn counts(&self) -> Result<TaskCounts> {
        let row = sqlx::query(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN is_completed = 0 THEN 1 ELSE 0 END), 0)
             FROM tasks",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(TaskCounts {
            total: u64::try_from(row.get::<i64, _>(0)).unwrap_or_default(),
            active: u64::try_from(row.get::<i64, _>(1)).unwrap_or_default(),
        })
    }
}

fn task_from_row(r: &SqliteRow) -> Task {
    Task {
        id: TaskId(r.get::<i64, _>("id")),
        title: r.get::<String, _>("title"),
        created_at: r.get::<DateTime<Utc>, _>("created_at"),
        is_completed: r.get::<bool, _>("is_completed"),
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
