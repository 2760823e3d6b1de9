//! Todo List API Server
//!
//! Usage:
//!   cargo run --bin todo_list_server
//!
//! Environment:
//!   PORT                 - Server port (default: 8080)
//!   TODO_HOST            - Server host (default: 0.0.0.0)
//!   MONGODB_URL          - Enables /v2/todos when set
//!   MONGODB_DB           - MongoDB database (default: todolist)
//!   TODO_CACHE_TTL_SECS  - /v3 page cache TTL (default: 300)
//!   TODO_MAX_CONCURRENCY - In-flight request limit (default: 512)
//!   RUST_LOG             - Log filter (default: info)

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use todo_list::{create_router, AppState, MongoTodoRepository, ServerConfig};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = ServerConfig::from_env();
    let addr = config.socket_addr()?;

    let mongo = match &config.mongodb_url {
        Some(url) => {
            let repo = MongoTodoRepository::connect(url, &config.mongodb_db).await?;
            match repo.ping().await {
                Ok(()) => info!("Connected to MongoDB database {}", config.mongodb_db),
                Err(e) => warn!("MongoDB not reachable yet, /v2/todos will retry per request: {}", e),
            }
            Some(repo)
        }
        None => {
            info!("MONGODB_URL not set, /v2/todos disabled");
            None
        }
    };

    let state = Arc::new(AppState::new(config, mongo));
    let notifications = state.notifications.clone();
    let telemetry = state.telemetry.clone();

    let app = create_router(state.clone());

    info!("Todo List API starting on http://{}", addr);
    info!("Endpoints:");
    for backend in state.backends() {
        info!("  {:<16} - {} store", backend.mount, backend.backend);
    }
    info!("  /v1/notifications - notification topic");
    info!("  /todos            - legacy scratch list");
    info!("  /v1/health        - Health check");
    info!("  /v1/stats         - Request and cache statistics");
    info!("Press Ctrl+C for graceful shutdown");

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown signal received, cleaning up...");
    notifications.shutdown().await;

    let stats = telemetry.get_stats();
    info!("   Total requests: {}", stats.total_requests);
    info!("   Client errors: {}", stats.client_errors);
    info!("   Server errors: {}", stats.server_errors);
    info!("Todo List API shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
