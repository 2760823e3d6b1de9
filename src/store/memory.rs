//! Serial-id todo store backing `/v1/todos`

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::repository::{Pagination, TodoRepository};
use crate::models::{AppError, AppResult, Todo, TodoDraft, TodoId, TodoPatch};

/// Ids start at 1 and are never reused, even after deletes.
pub struct MemoryTodoRepository {
    todos: RwLock<BTreeMap<u64, Todo>>,
    next_id: AtomicU64,
}

impl Default for MemoryTodoRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTodoRepository {
    pub fn new() -> Self {
        Self {
            todos: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.todos.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.todos.read().await.is_empty()
    }

    fn serial(id: &TodoId) -> AppResult<u64> {
        id.as_serial()
            .ok_or_else(|| AppError::invalid_id(&id.to_string()))
    }
}

#[async_trait]
impl TodoRepository for MemoryTodoRepository {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn parse_id(&self, raw: &str) -> AppResult<TodoId> {
        TodoId::parse_serial(raw)
    }

    async fn create(&self, draft: TodoDraft) -> AppResult<Todo> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let todo = draft.into_todo(TodoId::Serial(id));

        self.todos.write().await.insert(id, todo.clone());
        info!(id, "Todo created");
        Ok(todo)
    }

    async fn list(&self, page: Pagination) -> AppResult<Vec<Todo>> {
        let todos = self.todos.read().await;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.per_page).unwrap_or(usize::MAX);

        Ok(todos.values().skip(offset).take(limit).cloned().collect())
    }

    async fn get(&self, id: &TodoId) -> AppResult<Option<Todo>> {
        let id = Self::serial(id)?;
        Ok(self.todos.read().await.get(&id).cloned())
    }

    async fn update(&self, id: &TodoId, patch: TodoPatch) -> AppResult<Option<Todo>> {
        let id = Self::serial(id)?;
        let mut todos = self.todos.write().await;

        match todos.get_mut(&id) {
            Some(todo) => {
                patch.apply(todo);
                Ok(Some(todo.clone()))
            }
            None => {
                debug!("No todo found with ID: {}", id);
                Ok(None)
            }
        }
    }

    async fn delete(&self, id: &TodoId) -> AppResult<Option<Todo>> {
        let id = Self::serial(id)?;
        let removed = self.todos.write().await.remove(&id);
        if removed.is_none() {
            debug!("No todo found with ID: {}", id);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ids_are_serial_and_not_reused() {
        let repo = MemoryTodoRepository::new();
        let first = repo.create(TodoDraft::new("a")).await.unwrap();
        let second = repo.create(TodoDraft::new("b")).await.unwrap();
        assert_eq!(first.id, TodoId::Serial(1));
        assert_eq!(second.id, TodoId::Serial(2));

        repo.delete(&second.id).await.unwrap();
        let third = repo.create(TodoDraft::new("c")).await.unwrap();
        assert_eq!(third.id, TodoId::Serial(3));
    }

    #[tokio::test]
    async fn test_list_pages_in_id_order() {
        let repo = MemoryTodoRepository::new();
        for i in 0..25 {
            repo.create(TodoDraft::new(format!("todo {}", i))).await.unwrap();
        }

        let first = repo.list(Pagination::default()).await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first[0].id, TodoId::Serial(1));

        let last = repo.list(Pagination::new(3, 10)).await.unwrap();
        assert_eq!(last.len(), 5);
        assert_eq!(last[4].id, TodoId::Serial(25));

        assert!(repo.list(Pagination::new(4, 10)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let repo = MemoryTodoRepository::new();
        let patch = TodoPatch {
            completed: Some(true),
            ..Default::default()
        };
        assert!(repo.update(&TodoId::Serial(9), patch).await.unwrap().is_none());
        assert!(repo.delete(&TodoId::Serial(9)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_keeps_created_at() {
        let repo = MemoryTodoRepository::new();
        let todo = repo.create(TodoDraft::new("draft")).await.unwrap();
        let patch = TodoPatch {
            title: Some("final".into()),
            ..Default::default()
        };

        let updated = repo.update(&todo.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.title, "final");
        assert_eq!(updated.created_at, todo.created_at);
        assert_eq!(repo.get(&todo.id).await.unwrap().unwrap().title, "final");
    }

    #[tokio::test]
    async fn test_object_id_rejected() {
        let repo = MemoryTodoRepository::new();
        let err = repo.get(&TodoId::Object("abc".into())).await.unwrap_err();
        assert_eq!(err.code, crate::models::ErrorCode::InvalidId);
    }
}
