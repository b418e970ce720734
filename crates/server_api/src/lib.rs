use shared::{
    domain::{TaskId, MAX_TITLE_CHARS},
    error::{ApiError, ErrorCode},
    protocol::{Event, TaskRow, TaskView},
};
use storage::Storage;
use tracing::{debug, info};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

impl ApiContext {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

/// Applies one user event to the store and rebuilds the full view.
pub async fn dispatch(ctx: &ApiContext, event: Event) -> Result<TaskView, ApiError> {
    match event {
        Event::Delete { id } => delete_task(ctx, id).await?,
        Event::Toggle { id } => toggle_task(ctx, id).await?,
        Event::Add { title } => add_task(ctx, &title).await?,
    }
    render(ctx).await
}

/// Counters are derived from the same read as the rows.
pub async fn render(ctx: &ApiContext) -> Result<TaskView, ApiError> {
    let all = ctx.storage.list_all().await.map_err(internal)?;
    let active = all.iter().filter(|task| !task.is_completed).count();
    Ok(TaskView {
        total: all.len() as u64,
        active: active as u64,
        rows: all.into_iter().map(TaskRow::from).collect(),
        input: String::new(),
    })
}

async fn add_task(ctx: &ApiContext, title: &str) -> Result<(), ApiError> {
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ApiError::new(
            ErrorCode::Validation,
            format!("task title exceeds {MAX_TITLE_CHARS} characters"),
        ));
    }
    match ctx.storage.add(title).await.map_err(internal)? {
        Some(id) => info!(task_id = id.0, "task added"),
        None => debug!("ignoring add with blank title"),
    }
    Ok(())
}

async fn delete_task(ctx: &ApiContext, id: TaskId) -> Result<(), ApiError> {
    if ctx.storage.delete(id).await.map_err(internal)? {
        info!(task_id = id.0, "task deleted");
    } else {
        debug!(task_id = id.0, "delete for missing task ignored");
    }
    Ok(())
}

async fn toggle_task(ctx: &ApiContext, id: TaskId) -> Result<(), ApiError> {
    if !ctx.storage.toggle_status(id).await.map_err(internal)? {
        return Err(ApiError::new(
            ErrorCode::NotFound,
            format!("task {} not found", id.0),
        ));
    }
    info!(task_id = id.0, "task status toggled");
    Ok(())
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
