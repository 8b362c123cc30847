use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::header::{CACHE_CONTROL, EXPIRES, PRAGMA},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use tracing::info;

use crate::clock;
use crate::http::error::AppError;
use crate::http::types::{AppState, AttendanceRow, RangeParams, ScanRequest, ScanResponse};
use crate::status::resolve_status;
use crate::store::{self, QueryRange, DEFAULT_DEVICE_CODE};

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub async fn record_attendance_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanResponse>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let Some(uid) = non_blank(req.uid) else {
        return Err(AppError::Validation("uid is required".to_string()));
    };
    let scanned_at = match non_blank(req.timestamp) {
        Some(raw) => {
            clock::parse_scan_timestamp(&raw).map_err(|e| AppError::Validation(e.to_string()))?
        }
        None => Utc::now(),
    };
    let device_code = non_blank(req.device_code).unwrap_or_else(|| DEFAULT_DEVICE_CODE.to_string());

    let shared = Arc::clone(&state);
    let record = state
        .pool
        .with_conn(move |conn| {
            store::record_scan(conn, &uid, &device_code, scanned_at, |t| {
                resolve_status(t, &shared.demo_mode)
            })
        })
        .await
        .map_err(AppError::store("Failed to record attendance"))?;

    info!(
        name = %record.student.name,
        status = %record.status,
        device = record.device_label(),
        "attendance recorded"
    );

    Ok(Json(ScanResponse {
        success: true,
        name: record.student.name,
        status: record.status,
        timestamp: clock::format_civil(record.scanned_at),
    }))
}

pub async fn list_attendance_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Result<impl IntoResponse, AppError> {
    let range = params
        .range
        .as_deref()
        .map(QueryRange::parse)
        .unwrap_or(QueryRange::All);
    let limit = state.config.query_limit;

    let records = state
        .pool
        .with_conn(move |conn| store::query_range(conn, range, Utc::now(), limit))
        .await
        .map_err(AppError::store("Failed to fetch attendance"))?;

    info!(range = range.as_str(), count = records.len(), "attendance fetched");

    let rows: Vec<AttendanceRow> = records.iter().map(AttendanceRow::from).collect();
    Ok((
        [
            (
                CACHE_CONTROL,
                "no-store, no-cache, must-revalidate, proxy-revalidate",
            ),
            (PRAGMA, "no-cache"),
            (EXPIRES, "0"),
        ],
        [("surrogate-control", "no-store")],
        Json(rows),
    ))
}
