//! One-shot MongoDB user provisioning
//!
//! Selects the database named by `MONGODB_DB` and creates a single user
//! holding a single role on that database. Any missing variable aborts
//! the run before the server is contacted.

use mongodb::bson::{doc, Document};
use mongodb::Client;
use std::fmt;
use tracing::info;

use crate::models::{AppError, AppResult};

pub const ENV_DB: &str = "MONGODB_DB";
pub const ENV_USERNAME: &str = "MONGODB_TEST_USERNAME1";
pub const ENV_PASSWORD: &str = "MONGODB_TEST_PASSWORD1";
pub const ENV_ROLE: &str = "MONGODB_TEST_ROLE1";

pub const ENV_ADMIN_URL: &str = "MONGODB_URL";
pub const DEFAULT_ADMIN_URL: &str = "mongodb://localhost:27017";

#[derive(Clone)]
pub struct MongoUserSpec {
    pub database: String,
    pub username: String,
    password: String,
    pub role: String,
}

// Password stays out of logs
impl fmt::Debug for MongoUserSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoUserSpec")
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .field("role", &self.role)
            .finish()
    }
}

impl MongoUserSpec {
    pub fn new(
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            username: username.into(),
            password: password.into(),
            role: role.into(),
        }
    }

    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| AppError::missing_env(key))
        };

        Ok(Self {
            database: require(ENV_DB)?,
            username: require(ENV_USERNAME)?,
            password: require(ENV_PASSWORD)?,
            role: require(ENV_ROLE)?,
        })
    }

    /// `createUser` command granting exactly one role on `database`
    pub fn create_user_command(&self) -> Document {
        doc! {
            "createUser": self.username.as_str(),
            "pwd": self.password.as_str(),
            "roles": [
                { "role": self.role.as_str(), "db": self.database.as_str() }
            ],
        }
    }
}

pub fn admin_url_from_env() -> String {
    std::env::var(ENV_ADMIN_URL)
        .ok()
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_ADMIN_URL.to_string())
}

pub async fn provision_user(client: &Client, spec: &MongoUserSpec) -> AppResult<()> {
    info!(
        database = %spec.database,
        user = %spec.username,
        role = %spec.role,
        "Creating MongoDB user"
    );

    client
        .database(&spec.database)
        .run_command(spec.create_user_command(), None)
        .await?;

    info!(user = %spec.username, "MongoDB user created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorCode;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (ENV_DB, "todolist"),
            (ENV_USERNAME, "tester"),
            (ENV_PASSWORD, "s3cret"),
            (ENV_ROLE, "readWrite"),
        ])
    }

    #[test]
    fn test_reads_all_variables() {
        let env = full_env();
        let spec = MongoUserSpec::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(spec.database, "todolist");
        assert_eq!(spec.username, "tester");
        assert_eq!(spec.role, "readWrite");
    }

    #[test]
    fn test_missing_variable_names_it() {
        let mut env = full_env();
        env.remove(ENV_ROLE);
        let err = MongoUserSpec::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigMissingEnv);
        assert!(err.message.contains(ENV_ROLE));
    }

    #[test]
    fn test_empty_variable_is_missing() {
        let mut env = full_env();
        env.insert(ENV_PASSWORD, "");
        assert!(MongoUserSpec::from_lookup(|k| env.get(k).map(|v| v.to_string())).is_err());
    }

    #[test]
    fn test_create_user_command_shape() {
        let spec = MongoUserSpec::new("todolist", "tester", "s3cret", "readWrite");
        let command = spec.create_user_command();

        assert_eq!(command.get_str("createUser").unwrap(), "tester");
        assert_eq!(command.get_str("pwd").unwrap(), "s3cret");

        let roles = command.get_array("roles").unwrap();
        assert_eq!(roles.len(), 1);
        let role = roles[0].as_document().unwrap();
        assert_eq!(role.get_str("role").unwrap(), "readWrite");
        assert_eq!(role.get_str("db").unwrap(), "todolist");
    }

    #[test]
    fn test_debug_hides_password() {
        let spec = MongoUserSpec::new("todolist", "tester", "s3cret", "readWrite");
        let rendered = format!("{:?}", spec);
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("tester"));
    }
}
