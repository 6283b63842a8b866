//! JSON endpoints mounted under `/api`.

pub mod records;
pub mod sync;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use slate_core::error::SlateError;

use crate::AppState;

/// Build the API sub-router. Mounted under `/api` by the parent router.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sync/jobs", get(sync::list_jobs))
        .route("/sync/jobs/:id", get(sync::get_job))
        .route("/sync/:entity", post(sync::trigger_sync))
        .route("/terms/current", get(records::current_term))
        .route("/:entity", get(records::list_records))
}

pub(crate) fn error_response(err: &SlateError) -> (StatusCode, Json<Value>) {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"success": false, "error": err.to_string()})))
}

pub(crate) fn unknown_entity(entity: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"success": false, "error": format!("unknown entity type '{entity}'")})),
    )
}
