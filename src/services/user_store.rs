// src/services/user_store.rs
use async_trait::async_trait;
use firebase_rs::Firebase;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing;

use crate::{errors::NotifyError as AppError, models::user::UserRecord};

pub const USERS_PATH: &str = "users";

/// Read-only access to the registered users.
///
/// Each call returns whatever the store holds at read time; no consistency
/// across calls is promised.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn snapshot(&self) -> Result<Vec<UserRecord>, AppError>;
}

/// Reads the `users` node of a Firebase Realtime Database.
pub struct FirebaseUserStore {
    firebase: Firebase,
}

impl FirebaseUserStore {
    pub fn new(database_url: &str, auth_token: Option<&str>) -> Result<Self, AppError> {
        let firebase = match auth_token {
            Some(token) => Firebase::auth(database_url, token),
            None => Firebase::new(database_url),
        }
        .map_err(|e| AppError::InvalidStoreUrl(format!("{}: {:?}", database_url, e)))?;

        Ok(Self {
            firebase: firebase.at(USERS_PATH),
        })
    }
}

#[async_trait]
impl UserStore for FirebaseUserStore {
    async fn snapshot(&self) -> Result<Vec<UserRecord>, AppError> {
        tracing::debug!("Reading user snapshot from Firebase");

        let node = self
            .firebase
            .get::<Option<Value>>()
            .await
            .map_err(|e| AppError::store_read(format!("{:?}", e)))?;

        let users = parse_snapshot(node.unwrap_or(Value::Null))?;
        tracing::debug!("Read {} user records", users.len());
        Ok(users)
    }
}

/// Converts the raw `users` node into records, dropping entries that are not user documents.
///
/// The database returns a keyed node as an object, or as an array (with `null` holes)
/// when its keys are sequential integers.
pub fn parse_snapshot(node: Value) -> Result<Vec<UserRecord>, AppError> {
    let documents: Vec<(String, Value)> = match node {
        Value::Null => Vec::new(),
        Value::Object(map) => map.into_iter().collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, document)| !document.is_null())
            .map(|(index, document)| (index.to_string(), document))
            .collect(),
        other => {
            return Err(AppError::store_read(format!("Unexpected users node: {}", other)));
        }
    };

    Ok(documents
        .into_iter()
        .filter_map(|(user_id, document)| match serde_json::from_value::<UserRecord>(document) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::debug!("Skipping unreadable user record {}: {}", user_id, e);
                None
            }
        })
        .collect())
}

/// Fixed snapshot held in memory.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self {
            users: RwLock::new(users),
        }
    }

    pub async fn replace(&self, users: Vec<UserRecord>) {
        *self.users.write().await = users;
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn snapshot(&self) -> Result<Vec<UserRecord>, AppError> {
        Ok(self.users.read().await.clone())
    }
}
