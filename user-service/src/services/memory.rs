use crate::models::{GetResult, MutationResult, UserDocument};
use crate::services::store::{DocumentStore, StoreError};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// In-process store with the same key semantics as [`crate::services::MongoStore`].
#[derive(Default)]
pub struct MemoryStore {
    documents: DashMap<String, UserDocument>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(
        &self,
        key: &str,
        document: &UserDocument,
    ) -> Result<MutationResult, StoreError> {
        match self.documents.entry(key.to_string()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(key.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(document.clone());
                Ok(MutationResult::new(key, 1))
            }
        }
    }

    async fn get(&self, key: &str) -> Result<GetResult, StoreError> {
        self.documents
            .get(key)
            .map(|entry| GetResult {
                id: key.to_string(),
                content: entry.value().clone(),
            })
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn replace(
        &self,
        key: &str,
        document: &UserDocument,
    ) -> Result<MutationResult, StoreError> {
        let mut existing = self
            .documents
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        *existing = document.clone();
        Ok(MutationResult::new(key, 1))
    }

    async fn remove(&self, key: &str) -> Result<MutationResult, StoreError> {
        self.documents
            .remove(key)
            .map(|_| MutationResult::new(key, 1))
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
