//! Todo List Server Library
//!
//! Todo CRUD over HTTP with interchangeable storage backends:
//! - `/v1/todos`: in-memory store with serial ids
//! - `/v2/todos`: MongoDB collection
//! - `/v3/todos`: the v1 store behind a TTL page cache
//!
//! Plus an in-process notification topic and a legacy scratch list.

pub mod api;
pub mod models;
pub mod providers;
pub mod store;
pub mod utils;

pub use api::{create_router, AppState};
pub use models::{AppError, AppResult, ErrorCode, ServerConfig, Todo, TodoDraft, TodoId, TodoPatch};
pub use providers::{MongoTodoRepository, NotificationBus};
pub use store::{CachedTodoRepository, MemoryTodoRepository, Pagination, ScratchList, TodoRepository};
