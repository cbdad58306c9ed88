use crate::dtos::{CreateUserResponse, UserMutationResponse};
use crate::error::UserError;
use crate::models::UserDocument;
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

const CREATE_FAILED: &str = "Error creating user";
const NOT_FOUND: &str = "User not found";
const UPDATE_FAILED: &str = "Error updating user";
const DELETE_FAILED: &str = "Error deleting user";

pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<UserDocument>, JsonRejection>,
) -> Result<impl IntoResponse, UserError> {
    let Json(document) = body.map_err(UserError::rejected(CREATE_FAILED))?;
    let store = state.store.get().map_err(UserError::with(CREATE_FAILED))?;
    let id = state.keys.next_key();

    tracing::debug!(document_id = %id, document = ?document, "Attempting to insert document");

    let result = store
        .insert(&id, &document)
        .await
        .map_err(UserError::with(CREATE_FAILED))?;

    tracing::info!(document_id = %id, affected = result.affected, "User created");

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            message: "User created",
            id,
            result,
        }),
    ))
}

/// Returns the stored document as-is, without an envelope.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserDocument>, UserError> {
    let store = state.store.get().map_err(UserError::with(NOT_FOUND))?;

    let found = store.get(&id).await.map_err(UserError::with(NOT_FOUND))?;

    Ok(Json(found.content))
}

/// Full replacement; the id must already exist.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UserDocument>, JsonRejection>,
) -> Result<Json<UserMutationResponse>, UserError> {
    let Json(document) = body.map_err(UserError::rejected(UPDATE_FAILED))?;
    let store = state.store.get().map_err(UserError::with(UPDATE_FAILED))?;

    let result = store
        .replace(&id, &document)
        .await
        .map_err(UserError::with(UPDATE_FAILED))?;

    tracing::info!(document_id = %id, "User updated");

    Ok(Json(UserMutationResponse {
        message: "User updated",
        result,
    }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserMutationResponse>, UserError> {
    let store = state.store.get().map_err(UserError::with(DELETE_FAILED))?;

    let result = store
        .remove(&id)
        .await
        .map_err(UserError::with(DELETE_FAILED))?;

    tracing::info!(document_id = %id, "User deleted");

    Ok(Json(UserMutationResponse {
        message: "User deleted",
        result,
    }))
}
