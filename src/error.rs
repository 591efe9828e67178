/*
 * Responsibility
 * - HTTP-facing error shared by the gate and the server plumbing
 * - IntoResponse: status code + JSON string body ("Access denied", ...)
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Bad configuration")]
    BadConfiguration,

    #[error("Bad request")]
    BadRequest,

    #[error("Access denied")]
    AccessDenied,

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadConfiguration | AppError::BadRequest => StatusCode::BAD_REQUEST,
            AppError::AccessDenied => StatusCode::FORBIDDEN,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Body is a bare JSON string, e.g. "Access denied".
        (self.status(), Json(self.to_string())).into_response()
    }
}
