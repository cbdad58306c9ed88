use crate::models::{GetResult, MutationResult, UserDocument};
use async_trait::async_trait;
use mongodb::error::{ErrorKind, WriteFailure};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use thiserror::Error;

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("document already exists: {0}")]
    Conflict(String),

    #[error("document store unreachable: {0}")]
    Connectivity(anyhow::Error),

    #[error("document store is not initialized")]
    NotReady,

    #[error("document store error: {0}")]
    Other(anyhow::Error),
}

impl StoreError {
    /// Classifies a driver error raised while operating on `key`.
    pub fn from_mongo(err: mongodb::error::Error, key: &str) -> Self {
        let duplicate = matches!(
            err.kind.as_ref(),
            ErrorKind::Write(WriteFailure::WriteError(write_error))
                if write_error.code == DUPLICATE_KEY_CODE
        );
        if duplicate {
            return StoreError::Conflict(key.to_string());
        }

        let network = matches!(
            err.kind.as_ref(),
            ErrorKind::ServerSelection { .. }
                | ErrorKind::Io(_)
                | ErrorKind::ConnectionPoolCleared { .. }
        );
        if network {
            StoreError::Connectivity(anyhow::Error::new(err))
        } else {
            StoreError::Other(anyhow::Error::new(err))
        }
    }
}

/// Key/value document store addressed by [`crate::models::KEY_PREFIX`]-style keys.
///
/// `insert` fails with [`StoreError::Conflict`] on an existing key; `replace` and
/// `remove` fail with [`StoreError::NotFound`] on a missing one.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, key: &str, document: &UserDocument)
        -> Result<MutationResult, StoreError>;
    async fn get(&self, key: &str) -> Result<GetResult, StoreError>;
    async fn replace(
        &self,
        key: &str,
        document: &UserDocument,
    ) -> Result<MutationResult, StoreError>;
    async fn remove(&self, key: &str) -> Result<MutationResult, StoreError>;
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Set-once slot for the process-wide store, shared by every handler.
#[derive(Clone, Default)]
pub struct StoreHandle {
    inner: Arc<OnceCell<Arc<dyn DocumentStore>>>,
}

impl StoreHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ready(store: Arc<dyn DocumentStore>) -> Self {
        let handle = Self::new();
        handle.install(store);
        handle
    }

    /// Returns `false` if a store was already installed; the first one is kept.
    pub fn install(&self, store: Arc<dyn DocumentStore>) -> bool {
        self.inner.set(store).is_ok()
    }

    pub fn get(&self) -> Result<&Arc<dyn DocumentStore>, StoreError> {
        self.inner.get().ok_or(StoreError::NotReady)
    }

    pub fn is_ready(&self) -> bool {
        self.inner.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryStore;

    #[test]
    fn empty_handle_is_not_ready() {
        let handle = StoreHandle::new();

        assert!(!handle.is_ready());
        assert!(matches!(handle.get(), Err(StoreError::NotReady)));
    }

    #[test]
    fn install_keeps_first_store() {
        let handle = StoreHandle::new();

        assert!(handle.install(Arc::new(MemoryStore::new())));
        assert!(!handle.install(Arc::new(MemoryStore::new())));
        assert!(handle.is_ready());
    }

    #[test]
    fn clones_share_the_slot() {
        let handle = StoreHandle::new();
        let clone = handle.clone();

        handle.install(Arc::new(MemoryStore::new()));

        assert!(clone.is_ready());
    }

    #[test]
    fn not_ready_message_is_stable() {
        assert_eq!(
            StoreError::NotReady.to_string(),
            "document store is not initialized"
        );
    }
}
