use crate::services::StoreError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::ErrorResponse;
use thiserror::Error;

/// A failed user operation, tagged with the message shown to the caller,
/// e.g. "Error creating user".
#[derive(Debug, Error)]
pub enum UserError {
    #[error("{message}: {source}")]
    Store {
        message: &'static str,
        #[source]
        source: StoreError,
    },

    /// The body was missing, not JSON, or not a JSON object.
    #[error("{message}: {source}")]
    Body {
        message: &'static str,
        #[source]
        source: JsonRejection,
    },
}

impl UserError {
    pub fn new(message: &'static str, source: StoreError) -> Self {
        UserError::Store { message, source }
    }

    /// Curried form for `map_err`.
    pub fn with(message: &'static str) -> impl Fn(StoreError) -> Self {
        move |source| Self::new(message, source)
    }

    pub fn rejected(message: &'static str) -> impl Fn(JsonRejection) -> Self {
        move |source| UserError::Body { message, source }
    }

    pub fn message(&self) -> &'static str {
        match self {
            UserError::Store { message, .. } | UserError::Body { message, .. } => *message,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            UserError::Store { source, .. } => match source {
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                StoreError::Conflict(_) => StatusCode::CONFLICT,
                StoreError::Connectivity(_) | StoreError::NotReady => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                StoreError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            UserError::Body { source, .. } => source.status(),
        }
    }

    fn details(&self) -> String {
        match self {
            UserError::Store { source, .. } => source.to_string(),
            UserError::Body { source, .. } => source.body_text(),
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let details = self.details();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %details, "{}", self.message());
        } else {
            tracing::warn!(status = %status, error = %details, "{}", self.message());
        }

        (
            status,
            Json(ErrorResponse::new(self.message(), Some(details))),
        )
            .into_response()
    }
}
