//! Read-through page cache in front of another todo store (`/v3/todos`)

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::repository::{Pagination, TodoRepository};
use crate::models::{AppResult, Todo, TodoDraft, TodoId, TodoPatch};
use crate::utils::cache::{CacheStats, TtlCache};

pub const TODO_CACHE_KEY_PREFIX: &str = "todos:";

/// List pages are cached per `(page, per_page)`; single-item reads always
/// hit the inner store. Any successful write through this wrapper drops
/// every cached page.
///
/// `generation` moves on every invalidation. A page read from the inner
/// store is only kept if no write landed while it was being fetched.
pub struct CachedTodoRepository {
    inner: Arc<dyn TodoRepository>,
    cache: TtlCache<Vec<Todo>>,
    generation: AtomicU64,
}

impl CachedTodoRepository {
    pub fn new(inner: Arc<dyn TodoRepository>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::with_ttl(ttl),
            generation: AtomicU64::new(0),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cleanup_expired(&self) -> usize {
        self.cache.cleanup_expired()
    }

    fn invalidate_pages(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let removed = self.cache.invalidate_prefix(TODO_CACHE_KEY_PREFIX);
        debug!(removed, "Todo page cache invalidated");
    }
}

#[async_trait]
impl TodoRepository for CachedTodoRepository {
    fn backend_name(&self) -> &'static str {
        "cached"
    }

    fn parse_id(&self, raw: &str) -> AppResult<TodoId> {
        self.inner.parse_id(raw)
    }

    async fn create(&self, draft: TodoDraft) -> AppResult<Todo> {
        let todo = self.inner.create(draft).await?;
        self.invalidate_pages();
        Ok(todo)
    }

    async fn list(&self, page: Pagination) -> AppResult<Vec<Todo>> {
        let key = page.cache_key(TODO_CACHE_KEY_PREFIX);
        if let Some(todos) = self.cache.get(&key) {
            debug!("Get todos from cache");
            return Ok(todos);
        }

        let seen = self.generation.load(Ordering::SeqCst);
        let todos = self.inner.list(page).await?;
        debug!("Get todos from {}", self.inner.backend_name());

        if self.generation.load(Ordering::SeqCst) != seen {
            debug!("Todo page changed while loading, not cached");
            return Ok(todos);
        }
        self.cache.set(key.clone(), todos.clone());

        // A write may have invalidated between the check and the insert
        if self.generation.load(Ordering::SeqCst) != seen {
            self.cache.invalidate(&key);
        }
        Ok(todos)
    }

    async fn get(&self, id: &TodoId) -> AppResult<Option<Todo>> {
        self.inner.get(id).await
    }

    async fn update(&self, id: &TodoId, patch: TodoPatch) -> AppResult<Option<Todo>> {
        let updated = self.inner.update(id, patch).await?;
        if updated.is_some() {
            self.invalidate_pages();
        }
        Ok(updated)
    }

    async fn delete(&self, id: &TodoId) -> AppResult<Option<Todo>> {
        let deleted = self.inner.delete(id).await?;
        if deleted.is_some() {
            self.invalidate_pages();
        }
        Ok(deleted)
    }
}
