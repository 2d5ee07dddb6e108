use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;
use tracing::error;

use crate::{auth::services::AuthError, model::InferenceError};

/// Request-level failures and how each one reaches the browser.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("authentication required")]
    Unauthenticated,
    #[error("model inference failed: {0}")]
    ModelInference(#[from] InferenceError),
    #[error("database error: {0}")]
    Persistence(#[from] sqlx::Error),
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthenticated => Redirect::to("/login").into_response(),
            AppError::Auth(e) if e.is_user_facing() => {
                (StatusCode::BAD_REQUEST, e.to_string()).into_response()
            }
            other => {
                error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again later.",
                )
                    .into_response()
            }
        }
    }
}
