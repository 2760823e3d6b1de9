//! Storage abstraction shared by every todo backend

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::warn;

use crate::models::{AppResult, Todo, TodoDraft, TodoId, TodoPatch};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 10;

/// Common interface for todo stores.
///
/// Ids are backend specific, so parsing a raw path segment goes through
/// the repository that will later resolve it.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    fn backend_name(&self) -> &'static str;

    fn parse_id(&self, raw: &str) -> AppResult<TodoId>;

    async fn create(&self, draft: TodoDraft) -> AppResult<Todo>;

    /// One page of todos ordered by id ascending
    async fn list(&self, page: Pagination) -> AppResult<Vec<Todo>>;

    async fn get(&self, id: &TodoId) -> AppResult<Option<Todo>>;

    /// Returns the updated item, None when the id does not exist
    async fn update(&self, id: &TodoId, patch: TodoPatch) -> AppResult<Option<Todo>>;

    /// Returns the removed item, None when the id does not exist
    async fn delete(&self, id: &TodoId) -> AppResult<Option<Todo>>;
}

/// Page selection parsed from `page` / `per_page` query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Pagination {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Missing, malformed or non-positive values fall back to defaults
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        Self {
            page: positive_or_default(params, "page", DEFAULT_PAGE),
            per_page: positive_or_default(params, "per_page", DEFAULT_PER_PAGE),
        }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    pub fn cache_key(&self, prefix: &str) -> String {
        format!("{}{}:{}:{}", prefix, self.page, self.per_page, self.offset())
    }
}

fn positive_or_default(params: &HashMap<String, String>, key: &str, default: u64) -> u64 {
    let Some(raw) = params.get(key) else {
        return default;
    };

    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => value as u64,
        Ok(_) => {
            warn!("{} should be a positive integer. Using default value: {}", key, default);
            default
        }
        Err(_) => {
            warn!("Invalid format for {}: {}. Using default value: {}", key, raw, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let page = Pagination::from_params(&HashMap::new());
        assert_eq!(page, Pagination::default());
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_explicit_page() {
        let page = Pagination::from_params(&params(&[("page", "3"), ("per_page", "5")]));
        assert_eq!(page.page, 3);
        assert_eq!(page.per_page, 5);
        assert_eq!(page.offset(), 10);
        assert_eq!(page.cache_key("todos:"), "todos:3:5:10");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let page = Pagination::from_params(&params(&[("page", "0"), ("per_page", "abc")]));
        assert_eq!(page, Pagination::default());

        let page = Pagination::from_params(&params(&[("page", "-2")]));
        assert_eq!(page.page, DEFAULT_PAGE);
    }

    #[test]
    fn test_offset_saturates() {
        let page = Pagination::new(u64::MAX, u64::MAX);
        assert_eq!(page.offset(), u64::MAX);
    }
}
