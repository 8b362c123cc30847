use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use tracing::warn;

use crate::db;
use crate::http::types::AppState;
use crate::store::StoreError;

pub const ENDPOINTS: &[&str] = &["/api/attendance", "/api/demoMode", "/health"];

pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let probe = state
        .pool
        .with_conn(|conn| db::probe(conn).map_err(StoreError::from))
        .await;
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    match probe {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": true,
                "timestamp": timestamp,
                "error": null,
            })),
        ),
        Err(e) => {
            warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "database": false,
                    "timestamp": timestamp,
                    "error": e.to_string(),
                })),
            )
        }
    }
}

pub async fn banner_handler() -> impl IntoResponse {
    Json(json!({
        "message": "API RFID Attendance OK",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "endpoints": ENDPOINTS,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::handlers::test_support::{json_body, unreachable_state};

    #[tokio::test]
    async fn health_reports_503_when_database_is_unreachable() {
        let state = unreachable_state("attendd-health-down", "false");
        let resp = health_handler(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = json_body(resp).await;
        assert_eq!(body["status"], "unhealthy");
        assert_eq!(body["database"], false);
        assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
        assert!(body["timestamp"].is_string());
    }
}
