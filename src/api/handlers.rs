//! API Request Handlers

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::types::*;
use crate::models::{AppError, ServerConfig, Todo, TodoDraft, TodoNotification, TodoPatch};
use crate::providers::{MongoTodoRepository, NotificationBus, NotificationRecord, NOTIFICATION_TOPIC};
use crate::store::{
    CachedTodoRepository, MemoryTodoRepository, Pagination, ScratchEdit, ScratchList,
    ScratchRemoval, TodoRepository,
};
use crate::utils::RequestTelemetry;

const CACHE_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Store handle used as router state by the versioned todo routes
pub type TodoStore = Arc<dyn TodoRepository>;

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    pub v1: Arc<MemoryTodoRepository>,
    pub v2: Option<Arc<MongoTodoRepository>>,
    pub v3: Arc<CachedTodoRepository>,
    pub scratch: Arc<ScratchList>,
    pub notifications: Arc<NotificationBus>,
    pub telemetry: Arc<RequestTelemetry>,
    pub start_time: Instant,
}

impl AppState {
    /// Must be called inside a tokio runtime: spawns the notification
    /// consumer and the cache cleanup task.
    pub fn new(config: ServerConfig, mongo: Option<MongoTodoRepository>) -> Self {
        let v1 = Arc::new(MemoryTodoRepository::new());
        let v3 = Arc::new(CachedTodoRepository::new(v1.clone(), config.cache_ttl));

        let cache = v3.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CACHE_CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                let removed = cache.cleanup_expired();
                if removed > 0 {
                    info!("Cache cleanup: {} expired entries removed", removed);
                }
            }
        });

        Self {
            config,
            v1,
            v2: mongo.map(Arc::new),
            v3,
            scratch: Arc::new(ScratchList::new()),
            notifications: Arc::new(NotificationBus::start(NOTIFICATION_TOPIC)),
            telemetry: Arc::new(RequestTelemetry::new()),
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn backends(&self) -> Vec<BackendInfo> {
        let mut mounts: Vec<(&str, &str)> = vec![("/v1/todos", self.v1.backend_name())];
        if let Some(mongo) = &self.v2 {
            mounts.push(("/v2/todos", mongo.backend_name()));
        }
        mounts.push(("/v3/todos", self.v3.backend_name()));

        mounts
            .into_iter()
            .map(|(mount, backend)| BackendInfo {
                mount: mount.to_string(),
                backend: backend.to_string(),
            })
            .collect()
    }
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();

    let data = StatsData {
        requests: state.telemetry.get_stats(),
        cache: state.v3.cache_stats(),
        notifications: state.notifications.stats(),
        backends: state.backends(),
        v1_todos: state.v1.len().await,
        scratch_items: state.scratch.len().await,
        uptime_seconds: state.uptime_seconds(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

// ============================================
// Todos (v1 / v2 / v3)
// ============================================

fn parse_body<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!("Rejected todo body: {}", e);
        AppError::bad_request("Missing todo item")
    })
}

pub async fn list_todos(
    State(repo): State<TodoStore>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<Todo>> {
    let start = Instant::now();
    let page = Pagination::from_params(&params);

    let todos = repo.list(page).await.map_err(|e| fail(e, start))?;
    ok(StatusCode::OK, todos, start)
}

pub async fn create_todo(State(repo): State<TodoStore>, body: Bytes) -> ApiResult<Todo> {
    let start = Instant::now();

    let draft: TodoDraft = parse_body(&body).map_err(|e| fail(e, start))?;
    draft.validate().map_err(|e| fail(e, start))?;

    let todo = repo.create(draft).await.map_err(|e| fail(e, start))?;
    info!(backend = repo.backend_name(), id = %todo.id, "Todo created");
    ok(StatusCode::CREATED, todo, start)
}

pub async fn get_todo(State(repo): State<TodoStore>, Path(raw): Path<String>) -> ApiResult<Todo> {
    let start = Instant::now();
    let id = repo.parse_id(&raw).map_err(|e| fail(e, start))?;

    match repo.get(&id).await.map_err(|e| fail(e, start))? {
        Some(todo) => ok(StatusCode::OK, todo, start),
        None => Err(fail(AppError::not_found(format!("Todo {} not found", id)), start)),
    }
}

pub async fn update_todo(
    State(repo): State<TodoStore>,
    Path(raw): Path<String>,
    body: Bytes,
) -> ApiResult<Todo> {
    let start = Instant::now();
    let id = repo.parse_id(&raw).map_err(|e| fail(e, start))?;

    let not_found = || fail(AppError::not_found(format!("Todo {} not found", id)), start);

    if repo.get(&id).await.map_err(|e| fail(e, start))?.is_none() {
        return Err(not_found());
    }

    let patch: TodoPatch = parse_body(&body).map_err(|e| fail(e, start))?;
    patch.validate().map_err(|e| fail(e, start))?;

    match repo.update(&id, patch).await.map_err(|e| fail(e, start))? {
        Some(todo) => {
            info!(backend = repo.backend_name(), id = %todo.id, "Todo updated");
            ok(StatusCode::OK, todo, start)
        }
        None => Err(not_found()),
    }
}

pub async fn delete_todo(
    State(repo): State<TodoStore>,
    Path(raw): Path<String>,
) -> ApiResult<Todo> {
    let start = Instant::now();
    let id = repo.parse_id(&raw).map_err(|e| fail(e, start))?;

    match repo.delete(&id).await.map_err(|e| fail(e, start))? {
        Some(todo) => {
            info!(backend = repo.backend_name(), id = %todo.id, "Todo deleted");
            ok(StatusCode::OK, todo, start)
        }
        None => Err(fail(AppError::not_found(format!("Todo {} not found", id)), start)),
    }
}

// ============================================
// Notifications
// ============================================

pub async fn publish_notification(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<NotificationAck> {
    let start = Instant::now();

    let notification: TodoNotification = parse_body(&body).map_err(|e| fail(e, start))?;
    let value = String::from_utf8_lossy(&body).into_owned();

    let record = state
        .notifications
        .publish(notification.id, value)
        .await
        .map_err(|e| fail(e, start))?;

    ok(
        StatusCode::CREATED,
        NotificationAck {
            topic: record.topic,
            key: record.key,
            offset: record.offset,
        },
        start,
    )
}

pub async fn recent_notifications(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<NotificationRecord>> {
    let start = Instant::now();
    let limit = params
        .get("limit")
        .and_then(|raw| raw.parse::<usize>().ok())
        .unwrap_or(DEFAULT_RECENT_LIMIT);

    ok(StatusCode::OK, state.notifications.recent(limit), start)
}

// ============================================
// Legacy scratch list (/todos)
// ============================================

pub async fn list_scratch(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.scratch.items().await)
}

/// Raw bodies are stored as text; invalid UTF-8 is replaced, not rejected
fn scratch_text(body: &Bytes) -> String {
    String::from_utf8_lossy(body).into_owned()
}

pub async fn add_scratch(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let body = scratch_text(&body);
    let reply = format!("Added todo: {}", body);
    state.scratch.push(body).await;
    (StatusCode::CREATED, reply).into_response()
}

pub async fn update_scratch(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
    body: Bytes,
) -> Response {
    if state.scratch.is_empty().await {
        return (StatusCode::BAD_REQUEST, "No todos").into_response();
    }

    let Ok(index) = raw.parse::<i64>() else {
        return (StatusCode::BAD_REQUEST, format!("Invalid index: {}", raw)).into_response();
    };

    let body = scratch_text(&body);
    let reply = format!("Updated todo: {}", body);
    match state.scratch.replace(index, body).await {
        ScratchEdit::Empty => (StatusCode::BAD_REQUEST, "No todos").into_response(),
        ScratchEdit::OutOfRange => (StatusCode::NOT_FOUND, "Todo not found").into_response(),
        ScratchEdit::Replaced { .. } => (StatusCode::OK, reply).into_response(),
    }
}

pub async fn delete_scratch(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if state.scratch.is_empty().await {
        return (StatusCode::OK, Json(Vec::<String>::new())).into_response();
    }

    let Some(raw) = params.get("id") else {
        return (StatusCode::BAD_REQUEST, "Missing id").into_response();
    };
    let Ok(index) = raw.parse::<i64>() else {
        return (StatusCode::BAD_REQUEST, format!("Invalid id: {}", raw)).into_response();
    };

    match state.scratch.remove(index).await {
        ScratchRemoval::Empty => (StatusCode::OK, Json(Vec::<String>::new())).into_response(),
        ScratchRemoval::OutOfRange => (StatusCode::NOT_FOUND, "Todo not found").into_response(),
        ScratchRemoval::Removed(item) => {
            (StatusCode::OK, format!("Deleted todo: {}", item)).into_response()
        }
    }
}
