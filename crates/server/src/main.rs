use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use server_api::{dispatch, render, ApiContext};
use shared::{
    domain::TaskId,
    error::{ApiError, ErrorCode},
    protocol::{Event, TaskView, ViewNotice},
};
use storage::Storage;
use tokio::sync::broadcast;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};

mod app_state;
mod config;
mod view;

use app_state::AppState;
use config::{load_settings, prepare_database_url};

#[derive(Debug, Deserialize)]
struct AddTaskForm {
    #[serde(default)]
    title: String,
}

const MAX_REQUEST_BYTES: usize = 16 * 1024;
const NOTICE_CAPACITY: usize = 64;

type HttpError = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings();
    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .init();

    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

    let state = AppState {
        api: ApiContext::new(storage),
        notices,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, %database_url, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/tasks", post(form_add_task))
        .route("/tasks/:task_id/delete", post(form_delete_task))
        .route("/tasks/:task_id/toggle", post(form_toggle_task))
        .route("/api/view", get(http_view))
        .route("/api/events", post(http_event))
        .route("/ws", get(ws_handler))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BYTES))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.api.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            error!(%error, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, HttpError> {
    let view = render(&state.api).await.map_err(reject)?;
    Ok(Html(view::render_page(&view)))
}

async fn form_add_task(
    State(state): State<Arc<AppState>>,
    Form(form): Form<AddTaskForm>,
) -> Result<Redirect, HttpError> {
    apply(&state, Event::Add { title: form.title }).await?;
    Ok(Redirect::to("/"))
}

async fn form_delete_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<i64>,
) -> Result<Redirect, HttpError> {
    apply(&state, Event::Delete { id: TaskId(task_id) }).await?;
    Ok(Redirect::to("/"))
}

async fn form_toggle_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<i64>,
) -> Result<Redirect, HttpError> {
    apply(&state, Event::Toggle { id: TaskId(task_id) }).await?;
    Ok(Redirect::to("/"))
}

async fn http_view(State(state): State<Arc<AppState>>) -> Result<Json<TaskView>, HttpError> {
    let view = render(&state.api).await.map_err(reject)?;
    Ok(Json(view))
}

async fn http_event(
    State(state): State<Arc<AppState>>,
    Json(event): Json<Event>,
) -> Result<Json<TaskView>, HttpError> {
    let view = apply(&state, event).await?;
    Ok(Json(view))
}

async fn apply(state: &AppState, event: Event) -> Result<TaskView, HttpError> {
    let view = dispatch(&state.api, event).await.map_err(reject)?;
    let _ = state.notices.send(ViewNotice::TasksChanged {
        total: view.total,
        active: view.active,
    });
    Ok(view)
}

fn reject(err: ApiError) -> HttpError {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(error = %err, "request failed");
    } else {
        warn!(error = %err, "request rejected");
    }
    (status, Json(err))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: Arc<AppState>, socket: axum::extract::ws::WebSocket) {
    use axum::extract::ws::Message;
    use futures::{SinkExt, StreamExt};
    use tokio::sync::broadcast::error::RecvError;

    let (mut sender, mut receiver) = socket.split();
    let mut notices_rx = state.notices.subscribe();

    let send_task = tokio::spawn(async move {
        loop {
            let notice = match notices_rx.recv().await {
                Ok(notice) => notice,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "live refresh subscriber lagged");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let text = match serde_json::to_string(&notice) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(_msg)) = receiver.next().await {}

    send_task.abort();
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
