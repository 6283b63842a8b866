//! Sync trigger and job ledger endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use slate_core::error::SlateError;
use slate_core::models::sync::EntityType;
use slate_core::sync::ledger::SyncLedger;
use slate_core::sync::{sync_all, sync_entity};
use tracing::{info, warn};

use super::{error_response, unknown_entity};
use crate::AppState;

const DEFAULT_JOB_LIMIT: i64 = 20;
const MAX_JOB_LIMIT: i64 = 200;

/// `POST /api/sync/:entity`, where `entity` may also be `all`.
pub async fn trigger_sync(
    State(state): State<Arc<AppState>>,
    Path(entity): Path<String>,
) -> impl IntoResponse {
    let settings = state.config.sync_settings();

    if entity == "all" {
        info!("Sync of all entities requested");
        return match sync_all(&state.repo, &settings).await {
            Ok(results) => match serde_json::to_value(&results) {
                Ok(value) => (StatusCode::OK, Json(json!({"success": true, "results": value}))),
                Err(e) => error_response(&e.into()),
            },
            Err(e) => {
                warn!(error = %e, "Sync of all entities failed");
                error_response(&e)
            }
        };
    }

    let Ok(entity_type) = entity.parse::<EntityType>() else {
        return unknown_entity(&entity);
    };

    info!(entity = %entity_type, "Sync requested");
    match sync_entity(&state.repo, entity_type, &settings).await {
        Ok(result) => match serde_json::to_value(&result) {
            Ok(value) => (StatusCode::OK, Json(value)),
            Err(e) => error_response(&e.into()),
        },
        Err(e) => {
            warn!(entity = %entity_type, error = %e, "Sync failed");
            error_response(&e)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct JobsQuery {
    pub limit: Option<i64>,
}

/// `GET /api/sync/jobs?limit=n`, newest first.
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<JobsQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_JOB_LIMIT).clamp(1, MAX_JOB_LIMIT);
    match SyncLedger::new(&state.repo).recent(limit).await {
        Ok(jobs) => {
            let value = serde_json::to_value(&jobs).unwrap_or(Value::Array(vec![]));
            (StatusCode::OK, Json(json!({ "jobs": value })))
        }
        Err(e) => error_response(&e),
    }
}

/// `GET /api/sync/jobs/:id`.
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match SyncLedger::new(&state.repo).get(id).await {
        Ok(Some(job)) => match serde_json::to_value(&job) {
            Ok(value) => (StatusCode::OK, Json(json!({ "job": value }))),
            Err(e) => error_response(&e.into()),
        },
        Ok(None) => error_response(&SlateError::NotFound(format!("sync job {id}"))),
        Err(e) => error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use crate::router;
    use crate::test_support::{get_json, test_state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use slate_core::db::repository::{CredentialStore, SchoolRepository, SyncJobRepository};
    use slate_core::models::sync::{EntityType, SyncStatus};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn post(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn mock_upstream() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/ws/schema/query/com.slate.reportcards.schools"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "schools",
                "record": [
                    {"id": 1, "name": "schools", "tables": {"schools": {"id": "1", "name": "Springfield Elementary", "school_number": "100"}}}
                ]
            })))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn trigger_sync_returns_result() {
        let server = mock_upstream().await;
        let state = test_state().await;
        state
            .repo
            .configure_credential(&server.uri(), "id", "secret")
            .await
            .unwrap();

        let response = router(state.clone())
            .oneshot(post("/api/sync/schools"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = get_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["entity"], "schools");
        assert_eq!(json["count"], 1);
        assert!(json["durationMs"].is_u64());
        assert_eq!(json["preview"][0]["name"], "Springfield Elementary");

        assert_eq!(state.repo.list_schools().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn trigger_sync_without_credentials_is_400() {
        let state = test_state().await;
        let response = router(state.clone())
            .oneshot(post("/api/sync/courses"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = get_json(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("client_secret"));
        assert!(state.repo.list_sync_jobs(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn trigger_sync_upstream_failure_is_500_and_job_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/ws/schema/query/com.slate.reportcards.teachers"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;
        let state = test_state().await;
        state
            .repo
            .configure_credential(&server.uri(), "id", "secret")
            .await
            .unwrap();

        let response = router(state.clone())
            .oneshot(post("/api/sync/teachers"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let jobs = state.repo.list_sync_jobs(10).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].entity_type, EntityType::Teachers);
        assert_eq!(jobs[0].status, SyncStatus::Failed);
    }

    #[tokio::test]
    async fn trigger_unknown_entity_is_404() {
        let state = test_state().await;
        let response = router(state)
            .oneshot(post("/api/sync/students"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn jobs_listing_respects_limit() {
        let state = test_state().await;
        for entity in [EntityType::Schools, EntityType::Terms, EntityType::Courses] {
            state.repo.create_sync_job(entity).await.unwrap();
        }

        let response = router(state.clone())
            .oneshot(get("/api/sync/jobs?limit=2"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = get_json(response).await;
        let jobs = json["jobs"].as_array().unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0]["entityType"], "courses");
        assert_eq!(jobs[0]["status"], "pending");

        let response = router(state).oneshot(get("/api/sync/jobs")).await.unwrap();
        let json = get_json(response).await;
        assert_eq!(json["jobs"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn job_detail_found_and_missing() {
        let state = test_state().await;
        let job = state.repo.create_sync_job(EntityType::Terms).await.unwrap();

        let response = router(state.clone())
            .oneshot(get(&format!("/api/sync/jobs/{}", job.id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = get_json(response).await;
        assert_eq!(json["job"]["id"], job.id);
        assert_eq!(json["job"]["entityType"], "terms");

        let response = router(state)
            .oneshot(get("/api/sync/jobs/9999"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
