use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::info;

use crate::db;
use crate::demo_mode::{DemoMode, DEMO_MODE_KEY};
use crate::http::error::AppError;
use crate::http::types::{AppState, DemoModeResponse};
use crate::store::StoreError;

pub async fn demo_mode_get_handler(State(state): State<Arc<AppState>>) -> Json<DemoModeResponse> {
    Json(DemoModeResponse {
        demo_mode: state.demo_mode.is_enabled(),
    })
}

/// Flips demo mode in memory, then writes the new value to `system_settings`.
/// A failed write is reported as 500 but the in-memory flip stands.
pub async fn demo_mode_toggle_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DemoModeResponse>, AppError> {
    let enabled = state.demo_mode.toggle();
    let value = DemoMode::persisted_value(enabled);

    state
        .pool
        .with_conn(move |conn| db::settings_set(conn, DEMO_MODE_KEY, value).map_err(StoreError::from))
        .await
        .map_err(AppError::store("Failed to toggle demo mode"))?;

    info!(enabled, "demo mode toggled");
    Ok(Json(DemoModeResponse { demo_mode: enabled }))
}
