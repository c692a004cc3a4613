use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::app::response::ApiResponse;

/// Gateway-boundary error taxonomy. Everything a handler can fail with is
/// one of these, and every variant renders as the normalized envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request fields, rejected before any I/O.
    #[error("{0}")]
    Validation(String),

    /// Failure to establish or reuse a connection.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Operation rejected by the server (duplicate key, bad stage, ...).
    #[error("{0}")]
    Store(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Connection(_) => StatusCode::BAD_GATEWAY,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<mongodb::error::Error> for ApiError {
    fn from(err: mongodb::error::Error) -> Self {
        ApiError::Store(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}
