use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers::{
    attendance::{list_attendance_handler, record_attendance_handler},
    core::{banner_handler, health_handler},
    demo_mode::{demo_mode_get_handler, demo_mode_toggle_handler},
};
use super::types::AppState;

pub fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin {o:?}")))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60)))
}

pub fn build_router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let cors = cors_layer(&state.config.cors_origins)?;

    Ok(Router::new()
        .route("/", get(banner_handler))
        .route("/health", get(health_handler))
        .route(
            "/api/demoMode",
            get(demo_mode_get_handler).put(demo_mode_toggle_handler),
        )
        .route(
            "/api/attendance",
            get(list_attendance_handler).post(record_attendance_handler),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
