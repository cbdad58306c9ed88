use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn index() -> &'static str {
    "Hello World"
}

/// Liveness only; does not touch the store.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "user-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let outcome = match state.store.get() {
        Ok(store) => store.ping().await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "bucket": state.config.store.bucket,
                "collection": state.config.store.collection
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unavailable",
                "error": e.to_string()
            })),
        ),
    }
}
