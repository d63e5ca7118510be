use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Failures that are not the user's fault. Validation problems never reach
/// this type; they are rendered back into the originating form.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("database error: {0:#}")]
    Database(#[from] anyhow::Error),

    #[error("template error: {0}")]
    Render(#[from] tera::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

impl From<argon2::password_hash::Error> for ApiError {
    fn from(e: argon2::password_hash::Error) -> Self {
        Self::PasswordHash(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("{}", self);
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}
