use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("UID not registered")]
    NotFound { uid: String },

    #[error("{summary}")]
    Internal {
        summary: &'static str,
        #[source]
        source: StoreError,
    },
}

impl AppError {
    /// Maps a store failure, keeping an unknown student distinct from
    /// infrastructure trouble.
    pub fn store(summary: &'static str) -> impl FnOnce(StoreError) -> AppError {
        move |e| match e {
            StoreError::StudentNotFound { uid } => AppError::NotFound { uid },
            source => AppError::Internal { summary, source },
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "bad_params",
            AppError::NotFound { .. } => "not_found",
            AppError::Internal { .. } => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, body) = match &self {
            AppError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "code": code }),
            ),
            AppError::NotFound { uid } => (
                StatusCode::NOT_FOUND,
                json!({ "error": self.to_string(), "code": code, "uid": uid }),
            ),
            AppError::Internal { summary, source } => {
                error!(error = %source, "{summary}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": summary, "code": code }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
