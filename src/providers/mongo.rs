//! MongoDB todo store backing `/v2/todos`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use mongodb::options::{ClientOptions, FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{AppError, AppResult, Todo, TodoDraft, TodoId, TodoPatch};
use crate::store::{Pagination, TodoRepository};

pub const TODOS_COLLECTION: &str = "todos";
const APP_NAME: &str = "todo_list";

/// Build a client from a connection string. The driver connects lazily,
/// so this only fails on a malformed URL.
pub async fn connect_client(url: &str) -> AppResult<Client> {
    let mut options = ClientOptions::parse(url).await?;
    options.app_name = Some(APP_NAME.to_string());
    Ok(Client::with_options(options)?)
}

pub fn parse_object_id(raw: &str) -> AppResult<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| AppError::invalid_id(raw))
}

/// Stored shape of a todo in the `todos` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime",
        default = "chrono::Utc::now"
    )]
    pub created_at: DateTime<Utc>,
    #[serde(
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime",
        default = "chrono::Utc::now"
    )]
    pub updated_at: DateTime<Utc>,
}

impl TodoDocument {
    pub fn from_draft(draft: TodoDraft) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            title: draft.title,
            description: draft.description,
            completed: draft.completed,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_todo(self) -> AppResult<Todo> {
        let id = self
            .id
            .ok_or_else(|| AppError::store_failed("Todo document without _id"))?;

        Ok(Todo {
            id: TodoId::Object(id.to_hex()),
            title: self.title,
            description: self.description,
            completed: self.completed,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    /// `$set` update carrying only the fields present in the patch
    pub fn patch_update(patch: &TodoPatch, now: DateTime<Utc>) -> Document {
        let mut set = Document::new();
        if let Some(title) = &patch.title {
            set.insert("title", title.as_str());
        }
        if let Some(description) = &patch.description {
            set.insert("description", description.as_str());
        }
        if let Some(completed) = patch.completed {
            set.insert("completed", completed);
        }
        set.insert("updated_at", bson::DateTime::from_chrono(now));

        doc! { "$set": set }
    }
}

#[derive(Clone, Debug)]
pub struct MongoTodoRepository {
    client: Client,
    db_name: String,
}

impl MongoTodoRepository {
    pub fn new(client: Client, db_name: impl Into<String>) -> Self {
        Self {
            client,
            db_name: db_name.into(),
        }
    }

    pub async fn connect(url: &str, db_name: &str) -> AppResult<Self> {
        let client = connect_client(url).await?;
        info!(database = %db_name, "MongoDB client created");
        Ok(Self::new(client, db_name))
    }

    /// Round-trip to the server to check it is reachable
    pub async fn ping(&self) -> AppResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }

    fn collection(&self) -> Collection<TodoDocument> {
        self.client
            .database(&self.db_name)
            .collection(TODOS_COLLECTION)
    }

    fn object_id(id: &TodoId) -> AppResult<ObjectId> {
        match id {
            TodoId::Object(hex) => parse_object_id(hex),
            TodoId::Serial(serial) => Err(AppError::invalid_id(&serial.to_string())),
        }
    }
}

#[async_trait]
impl TodoRepository for MongoTodoRepository {
    fn backend_name(&self) -> &'static str {
        "mongodb"
    }

    fn parse_id(&self, raw: &str) -> AppResult<TodoId> {
        parse_object_id(raw).map(|oid| TodoId::Object(oid.to_hex()))
    }

    async fn create(&self, draft: TodoDraft) -> AppResult<Todo> {
        let mut document = TodoDocument::from_draft(draft);
        let result = self.collection().insert_one(&document, None).await?;
        document.id = result.inserted_id.as_object_id();

        let todo = document.into_todo()?;
        info!(id = %todo.id, "Todo document inserted");
        Ok(todo)
    }

    async fn list(&self, page: Pagination) -> AppResult<Vec<Todo>> {
        let options = FindOptions::builder()
            .sort(doc! { "_id": 1 })
            .skip(page.offset())
            .limit(i64::try_from(page.per_page).unwrap_or(i64::MAX))
            .build();

        let cursor = self.collection().find(None, options).await?;
        let documents: Vec<TodoDocument> = cursor.try_collect().await?;
        debug!(count = documents.len(), "Todo documents fetched");

        documents.into_iter().map(TodoDocument::into_todo).collect()
    }

    async fn get(&self, id: &TodoId) -> AppResult<Option<Todo>> {
        let oid = Self::object_id(id)?;
        self.collection()
            .find_one(doc! { "_id": oid }, None)
            .await?
            .map(TodoDocument::into_todo)
            .transpose()
    }

    async fn update(&self, id: &TodoId, patch: TodoPatch) -> AppResult<Option<Todo>> {
        let oid = Self::object_id(id)?;
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.collection()
            .find_one_and_update(
                doc! { "_id": oid },
                TodoDocument::patch_update(&patch, Utc::now()),
                options,
            )
            .await?
            .map(TodoDocument::into_todo)
            .transpose()
    }

    async fn delete(&self, id: &TodoId) -> AppResult<Option<Todo>> {
        let oid = Self::object_id(id)?;
        self.collection()
            .find_one_and_delete(doc! { "_id": oid }, None)
            .await?
            .map(TodoDocument::into_todo)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorCode;

    #[test]
    fn test_parse_object_id() {
        let oid = ObjectId::new();
        assert_eq!(parse_object_id(&oid.to_hex()).unwrap(), oid);

        let err = parse_object_id("42").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidId);
    }

    #[test]
    fn test_document_without_id_is_rejected() {
        let document = TodoDocument::from_draft(TodoDraft::new("orphan"));
        assert!(document.into_todo().is_err());
    }

    #[test]
    fn test_document_into_todo_uses_hex_id() {
        let oid = ObjectId::new();
        let mut document = TodoDocument::from_draft(TodoDraft::new("ship it"));
        document.id = Some(oid);

        let todo = document.into_todo().unwrap();
        assert_eq!(todo.id, TodoId::Object(oid.to_hex()));
        assert_eq!(todo.title, "ship it");
    }

    #[test]
    fn test_document_bson_roundtrip_keeps_dates() {
        let mut document = TodoDocument::from_draft(TodoDraft::new("dated"));
        document.id = Some(ObjectId::new());

        let raw = bson::to_document(&document).unwrap();
        assert!(raw.get_datetime("created_at").is_ok());

        let back: TodoDocument = bson::from_document(raw).unwrap();
        assert_eq!(back.title, "dated");
        assert_eq!(
            back.created_at.timestamp_millis(),
            document.created_at.timestamp_millis()
        );
    }

    #[test]
    fn test_patch_update_sets_present_fields_only() {
        let patch = TodoPatch {
            completed: Some(true),
            ..Default::default()
        };
        let update = TodoDocument::patch_update(&patch, Utc::now());
        let set = update.get_document("$set").unwrap();

        assert!(set.get_bool("completed").unwrap());
        assert!(set.get("title").is_none());
        assert!(set.get_datetime("updated_at").is_ok());
    }

    #[tokio::test]
    async fn test_repository_parses_ids_without_server() {
        let repo = MongoTodoRepository::connect("mongodb://localhost:27017", "todolist")
            .await
            .unwrap();
        assert_eq!(repo.backend_name(), "mongodb");
        assert!(repo.parse_id("not-an-object-id").is_err());

        let hex = ObjectId::new().to_hex();
        assert_eq!(repo.parse_id(&hex).unwrap(), TodoId::Object(hex));
    }
}
