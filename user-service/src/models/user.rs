use serde::{Deserialize, Serialize};

/// Prefix shared by every generated document key.
pub const KEY_PREFIX: &str = "user::";

/// Caller-supplied user record. Never inspected or rewritten by the service.
pub type UserDocument = serde_json::Map<String, serde_json::Value>;

/// Outcome of a write against the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResult {
    pub id: String,
    /// Number of documents the store reports as written or removed.
    pub affected: u64,
}

impl MutationResult {
    pub fn new(id: impl Into<String>, affected: u64) -> Self {
        Self {
            id: id.into(),
            affected,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetResult {
    pub id: String,
    pub content: UserDocument,
}
