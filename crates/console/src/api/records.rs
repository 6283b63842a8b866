//! Read-only views of synced records, wrapped as `{ "<entity>": [...] }`.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use slate_core::db::repository::{
    CourseRepository, EmailAddressRepository, SchoolRepository, TeacherRepository, TermRepository,
};
use slate_core::error::Result;
use slate_core::models::sync::EntityType;

use super::{error_response, unknown_entity};
use crate::AppState;

fn envelope<T: Serialize>(entity: EntityType, items: Result<Vec<T>>) -> (StatusCode, Json<Value>) {
    match items.and_then(|items| Ok(serde_json::to_value(items)?)) {
        Ok(value) => (StatusCode::OK, Json(json!({ entity.as_str(): value }))),
        Err(e) => error_response(&e),
    }
}

pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Path(entity): Path<String>,
) -> impl IntoResponse {
    let Ok(entity_type) = entity.parse::<EntityType>() else {
        return unknown_entity(&entity);
    };

    let repo = &state.repo;
    match entity_type {
        EntityType::Schools => envelope(entity_type, repo.list_schools().await),
        EntityType::Terms => envelope(entity_type, repo.list_terms().await),
        EntityType::Teachers => envelope(entity_type, repo.list_teachers().await),
        EntityType::Courses => envelope(entity_type, repo.list_courses().await),
        EntityType::Contacts => envelope(entity_type, repo.list_email_addresses().await),
    }
}

pub async fn current_term(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.repo.get_current_term().await {
        Ok(Some(term)) => match serde_json::to_value(&term) {
            Ok(value) => (StatusCode::OK, Json(json!({ "term": value }))),
            Err(e) => error_response(&e.into()),
        },
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "no current term"})),
        ),
        Err(e) => error_response(&e),
    }
}
