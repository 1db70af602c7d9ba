//! Error types for cinema-site handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cinema_common::review_form::FieldErrors;
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g. slug already taken
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Review form rejected in strict mode (422)
    #[error("Invalid review: {0}")]
    InvalidReview(FieldErrors),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// cinema-common error
    #[error("Common error: {0}")]
    Common(#[from] cinema_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use cinema_common::Error as CommonError;

        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::InvalidReview(fields) => {
                let body = Json(json!({
                    "error": {
                        "code": "INVALID_REVIEW",
                        "message": fields.to_string(),
                        "fields": fields,
                    }
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
            ApiError::Common(err) => match err {
                CommonError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
                CommonError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
                CommonError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
                other => {
                    tracing::error!("Request failed: {}", other);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "COMMON_ERROR",
                        other.to_string(),
                    )
                }
            },
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_errors_keep_their_status() {
        let cases = [
            (cinema_common::Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (cinema_common::Error::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (cinema_common::Error::Conflict("x".into()), StatusCode::CONFLICT),
            (cinema_common::Error::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_invalid_review_is_422() {
        let mut fields = FieldErrors::default();
        fields.add("email", "Enter a valid email address.");
        let response = ApiError::InvalidReview(fields).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
