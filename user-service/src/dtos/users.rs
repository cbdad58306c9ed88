use crate::models::MutationResult;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub message: &'static str,
    pub id: String,
    pub result: MutationResult,
}

/// Body for PUT and DELETE on `/users/:id`.
#[derive(Debug, Serialize)]
pub struct UserMutationResponse {
    pub message: &'static str,
    pub result: MutationResult,
}
