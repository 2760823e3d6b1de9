//! Todo data types shared by every storage backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::{AppError, AppResult};

/// Backend-specific todo identifier.
///
/// Serial stores hand out integers, MongoDB hands out ObjectId hex strings.
/// Serialized untagged so clients see a plain number or string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TodoId {
    Serial(u64),
    Object(String),
}

impl TodoId {
    /// Parse a serial id: one or more ASCII digits that fit in u64
    pub fn parse_serial(raw: &str) -> AppResult<Self> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::invalid_id(raw));
        }
        raw.parse::<u64>()
            .map(Self::Serial)
            .map_err(|_| AppError::invalid_id(raw))
    }

    pub fn as_serial(&self) -> Option<u64> {
        match self {
            Self::Serial(id) => Some(*id),
            Self::Object(_) => None,
        }
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial(id) => write!(f, "{}", id),
            Self::Object(hex) => f.write_str(hex),
        }
    }
}

/// A stored todo item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of a create request
#[derive(Debug, Clone, Deserialize)]
pub struct TodoDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

impl TodoDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            completed: false,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::bad_request("Todo title must not be empty"));
        }
        Ok(())
    }

    /// Materialize the draft under a freshly assigned id
    pub fn into_todo(self, id: TodoId) -> Todo {
        let now = Utc::now();
        Todo {
            id,
            title: self.title,
            description: self.description,
            completed: self.completed,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Body of an update request; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.is_empty() {
            return Err(AppError::bad_request("Update body has no fields to change"));
        }
        if matches!(&self.title, Some(title) if title.trim().is_empty()) {
            return Err(AppError::bad_request("Todo title must not be empty"));
        }
        Ok(())
    }

    pub fn apply(&self, todo: &mut Todo) {
        if let Some(title) = &self.title {
            todo.title = title.clone();
        }
        if let Some(description) = &self.description {
            todo.description = description.clone();
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
        todo.updated_at = Utc::now();
    }
}

/// Payload accepted by the notification endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoNotification {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serial() {
        assert_eq!(TodoId::parse_serial("42").unwrap(), TodoId::Serial(42));
        assert!(TodoId::parse_serial("").is_err());
        assert!(TodoId::parse_serial("-1").is_err());
        assert!(TodoId::parse_serial("+1").is_err());
        assert!(TodoId::parse_serial("12a").is_err());
        assert!(TodoId::parse_serial("99999999999999999999999").is_err());
    }

    #[test]
    fn test_id_serializes_untagged() {
        assert_eq!(serde_json::to_string(&TodoId::Serial(7)).unwrap(), "7");
        assert_eq!(
            serde_json::to_string(&TodoId::Object("65a1".into())).unwrap(),
            "\"65a1\""
        );
    }

    #[test]
    fn test_draft_defaults_and_validation() {
        let draft: TodoDraft = serde_json::from_str(r#"{"title":"buy milk"}"#).unwrap();
        assert_eq!(draft.description, "");
        assert!(!draft.completed);
        assert!(draft.validate().is_ok());

        let blank: TodoDraft = serde_json::from_str(r#"{"title":"   "}"#).unwrap();
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut todo = TodoDraft::new("write report").into_todo(TodoId::Serial(1));
        let created = todo.updated_at;

        let patch = TodoPatch {
            completed: Some(true),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
        patch.apply(&mut todo);

        assert_eq!(todo.title, "write report");
        assert!(todo.completed);
        assert!(todo.updated_at >= created);
    }

    #[test]
    fn test_empty_patch_rejected() {
        assert!(TodoPatch::default().validate().is_err());
        let blank_title = TodoPatch {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(blank_title.validate().is_err());
    }
}
