use crate::config::StoreConfig;
use crate::models::{GetResult, MutationResult, UserDocument};
use crate::services::store::{DocumentStore, StoreError};
use async_trait::async_trait;
use mongodb::{
    bson::{doc, Bson, Document},
    options::{ClientOptions, Credential},
    Client as MongoClient, Collection,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use std::time::Duration;

/// Field holding the caller's document as JSON text; `_id` holds the key.
///
/// Kept as a string so the driver never reads `$`-prefixed keys as extended
/// JSON and integers outside the BSON range survive.
const CONTENT_FIELD: &str = "content";

#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    users: Collection<Document>,
}

impl MongoStore {
    pub async fn connect(config: &StoreConfig) -> Result<Self, AppError> {
        tracing::info!(
            uri = %config.uri,
            bucket = %config.bucket,
            collection = %config.collection,
            "Connecting to document store"
        );

        let mut options = ClientOptions::parse(&config.uri).await.map_err(|e| {
            tracing::error!("Invalid document store URI {}: {}", config.uri, e);
            AppError::from(e)
        })?;

        let timeout = Duration::from_millis(config.timeout_ms);
        options.app_name = Some("user-service".to_string());
        options.server_selection_timeout = Some(timeout);
        options.connect_timeout = Some(timeout);

        if let Some(username) = &config.username {
            let mut credential = Credential::default();
            credential.username = Some(username.clone());
            credential.password = config
                .password
                .as_ref()
                .map(|password| password.expose_secret().clone());
            options.credential = Some(credential);
        }

        let client = MongoClient::with_options(options).map_err(|e| {
            tracing::error!("Failed to create document store client: {}", e);
            AppError::from(e)
        })?;
        let users = client
            .database(&config.bucket)
            .collection::<Document>(&config.collection);

        tracing::info!(bucket = %config.bucket, "Document store client ready");
        Ok(Self { client, users })
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    fn record(key: &str, document: &UserDocument) -> Result<Document, StoreError> {
        let content = serde_json::to_string(document).map_err(|e| {
            StoreError::Other(anyhow::anyhow!("Failed to encode document {}: {}", key, e))
        })?;
        Ok(doc! { "_id": key, "content": content })
    }

    fn content(key: &str, mut record: Document) -> Result<UserDocument, StoreError> {
        match record.remove(CONTENT_FIELD) {
            Some(Bson::String(raw)) => serde_json::from_str(&raw).map_err(|e| {
                StoreError::Other(anyhow::anyhow!("Failed to decode document {}: {}", key, e))
            }),
            _ => Err(StoreError::Other(anyhow::anyhow!(
                "Stored record {} has no content",
                key
            ))),
        }
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert(
        &self,
        key: &str,
        document: &UserDocument,
    ) -> Result<MutationResult, StoreError> {
        let record = Self::record(key, document)?;
        self.users
            .insert_one(record, None)
            .await
            .map_err(|e| StoreError::from_mongo(e, key))?;
        Ok(MutationResult::new(key, 1))
    }

    async fn get(&self, key: &str) -> Result<GetResult, StoreError> {
        let record = self
            .users
            .find_one(doc! { "_id": key }, None)
            .await
            .map_err(|e| StoreError::from_mongo(e, key))?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        Ok(GetResult {
            id: key.to_string(),
            content: Self::content(key, record)?,
        })
    }

    async fn replace(
        &self,
        key: &str,
        document: &UserDocument,
    ) -> Result<MutationResult, StoreError> {
        let record = Self::record(key, document)?;
        let result = self
            .users
            .replace_one(doc! { "_id": key }, record, None)
            .await
            .map_err(|e| StoreError::from_mongo(e, key))?;

        if result.matched_count == 0 {
            return Err(StoreError::NotFound(key.to_string()));
        }
        Ok(MutationResult::new(key, result.matched_count))
    }

    async fn remove(&self, key: &str) -> Result<MutationResult, StoreError> {
        let result = self
            .users
            .delete_one(doc! { "_id": key }, None)
            .await
            .map_err(|e| StoreError::from_mongo(e, key))?;

        if result.deleted_count == 0 {
            return Err(StoreError::NotFound(key.to_string()));
        }
        Ok(MutationResult::new(key, result.deleted_count))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("Document store health check failed: {}", e);
                StoreError::from_mongo(e, "admin")
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_wraps_content_under_key() {
        let document = json!({ "name": "Alice", "_id": "spoofed" })
            .as_object()
            .cloned()
            .unwrap();

        let record = MongoStore::record("user::1", &document).unwrap();

        assert_eq!(record.get_str("_id").unwrap(), "user::1");
        let content: serde_json::Value =
            serde_json::from_str(record.get_str(CONTENT_FIELD).unwrap()).unwrap();
        assert_eq!(content["name"], "Alice");
        assert_eq!(content["_id"], "spoofed");
    }

    #[test]
    fn content_round_trips_nested_values() {
        let document = json!({
            "name": "Alice",
            "age": 30,
            "active": true,
            "address": { "city": "Rome" },
            "tags": ["a", "b"],
            "nickname": null
        })
        .as_object()
        .cloned()
        .unwrap();

        let record = MongoStore::record("user::1", &document).unwrap();

        assert_eq!(MongoStore::content("user::1", record).unwrap(), document);
    }

    #[test]
    fn extended_json_shapes_are_not_reinterpreted() {
        let shapes = [
            json!({ "x": { "$numberLong": "5" } }),
            json!({ "d": { "$date": { "$numberLong": "0" } } }),
            json!({ "o": { "$oid": "507f1f77bcf86cd799439011" } }),
            json!({ "n": 18446744073709551615u64 }),
            json!({ "$set": { "admin": true } }),
        ];

        for shape in shapes {
            let document = shape.as_object().cloned().unwrap();

            let record = MongoStore::record("user::1", &document).unwrap();

            assert_eq!(
                MongoStore::content("user::1", record).unwrap(),
                document,
                "changed in transit: {}",
                shape
            );
        }
    }

    #[test]
    fn non_object_content_is_rejected() {
        let err =
            MongoStore::content("user::1", doc! { "_id": "user::1", "content": "[1,2]" })
                .unwrap_err();

        assert!(matches!(err, StoreError::Other(_)));
    }

    #[test]
    fn content_without_object_is_rejected() {
        let err = MongoStore::content("user::1", doc! { "_id": "user::1" }).unwrap_err();

        assert!(matches!(err, StoreError::Other(_)));
    }
}
