use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Failures surfaced by the user and transaction stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Insert collided with the unique index on `users.email`.
    #[error("email already registered")]
    DuplicateEmail,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors returned by HTTP handlers. Every variant renders as `{"message": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad or missing input.
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid or expired token, or the token's user is gone.
    #[error("{0}")]
    Unauthenticated(String),

    /// A list endpoint found nothing to return.
    #[error("{0}")]
    NotFound(String),

    /// The path exists but not for this method.
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// Duplicate registration. Reported as 400, like any other rejected input.
    #[error("{0}")]
    Conflict(String),

    /// Anything unexpected. The detail is logged and never sent to the client.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => ApiError::Conflict("User already exists".into()),
            StoreError::Database(e) => ApiError::Internal(e.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(e) => {
                error!(error = %e, "request failed");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}
