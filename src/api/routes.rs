//! API Route Configuration

use axum::{
    middleware,
    routing::{get, patch},
    Router,
};
use std::sync::Arc;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{self, AppState, TodoStore};
use super::middleware::{logging_middleware, require_json_content_type};

/// CRUD routes over a single todo store, JSON content type required
pub fn todo_routes<S>(repo: TodoStore) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(handlers::list_todos).post(handlers::create_todo))
        .route(
            "/:id",
            get(handlers::get_todo)
                .patch(handlers::update_todo)
                .delete(handlers::delete_todo),
        )
        .route_layer(middleware::from_fn(require_json_content_type))
        .with_state(repo)
}

fn notification_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(handlers::recent_notifications).post(handlers::publish_notification),
        )
        .route_layer(middleware::from_fn(require_json_content_type))
}

/// Create the API router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats))
        .nest("/todos", todo_routes(state.v1.clone()))
        .nest("/notifications", notification_routes());

    let mut router = Router::new()
        .nest("/v1", api_v1)
        .nest("/v3/todos", todo_routes(state.v3.clone()));

    // MongoDB store only when configured
    if let Some(mongo) = &state.v2 {
        router = router.nest("/v2/todos", todo_routes(mongo.clone()));
    }

    // Legacy scratch list
    let router = router
        .route(
            "/todos",
            get(handlers::list_scratch)
                .post(handlers::add_scratch)
                .delete(handlers::delete_scratch),
        )
        .route("/todos/:index", patch(handlers::update_scratch))
        .route("/health", get(handlers::health_check));

    let telemetry = state.telemetry.clone();
    let max_concurrent = state.config.max_concurrent_requests;

    router
        .with_state(state)
        // Middleware (order matters - bottom runs first)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn_with_state(telemetry, logging_middleware))
        .layer(GlobalConcurrencyLimitLayer::new(max_concurrent))
}
