//! Slate Console: JSON API over the sync engine.
//!
//! Exposes "trigger sync" and "list synced records" per entity, the current
//! term and the sync job ledger.

pub mod api;

use std::sync::Arc;

use axum::{routing::get, Router};
use slate_core::config::SlateConfig;
use slate_core::db::sqlite::SqliteRepository;

/// Shared application state for all console routes.
pub struct AppState {
    pub repo: SqliteRepository,
    pub config: SlateConfig,
}

/// Build the console router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api::api_router())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::body::Body;
    use serde_json::Value;

    pub async fn test_state() -> Arc<AppState> {
        let pool = slate_core::db::DatabasePool::new_sqlite_memory()
            .await
            .unwrap();
        let repo = match pool {
            slate_core::db::DatabasePool::Sqlite(p) => SqliteRepository::new(p),
        };
        let config = SlateConfig::generate_default();
        Arc::new(AppState { repo, config })
    }

    pub async fn get_json(response: axum::http::Response<Body>) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }
}
