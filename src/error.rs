//! Error types shared by services and handlers.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Errors returned by the service layer.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("request invalid: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("not found")]
    NotFound,

    #[error("forbidden")]
    Forbidden,

    /// The caller's claims do not resolve to a stored user.
    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

const FORBIDDEN: &str = "You do not have permission to access this resource";

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Error returned from handlers, rendered as `{"message": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(MessageResponse::new(self.to_string()))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl ServiceError {
    /// Map a service failure to a response, with the resource-specific
    /// messages for the not-found and forbidden cases.
    pub fn respond(self, not_found: &str, forbidden: &str) -> AppError {
        match self {
            ServiceError::Validation(e) => AppError::BadRequest(e.to_string()),
            ServiceError::NotFound => AppError::NotFound(not_found.to_string()),
            ServiceError::Forbidden => AppError::Forbidden(forbidden.to_string()),
            ServiceError::UserNotFound => AppError::Unauthorized("User not found".into()),
            ServiceError::Internal(e) => AppError::Internal(e),
        }
    }

    /// [`respond`](Self::respond) for reads, which have no resource-specific
    /// forbidden message.
    pub fn respond_not_found(self, not_found: &str) -> AppError {
        self.respond(not_found, FORBIDDEN)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
