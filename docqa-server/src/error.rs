use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use docqa_rag::RagError;
use tracing::warn;

use crate::protocol::ErrorBody;

/// Body text returned for every internal failure; causes stay in the logs.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error.";

/// API-layer error type
#[derive(Debug)]
pub enum ApiError {
    /// 400 - Bad request (invalid input)
    BadRequest(String),

    /// 500 - Internal error
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", INTERNAL_ERROR_MESSAGE.into())
            }
        };

        let body = ErrorBody { error: error_type.into(), message };

        (status, Json(body)).into_response()
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        // the pipeline already logged the cause
        warn!(kind = err.kind(), "responding with internal error");
        ApiError::Internal
    }
}
