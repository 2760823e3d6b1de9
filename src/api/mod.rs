//! Todo List HTTP API Module
//! Versioned todo stores, notifications and the legacy scratch list

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

pub use handlers::AppState;
pub use routes::create_router;
pub use types::*;
