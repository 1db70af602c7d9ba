//! Authentication middleware for the back office
//!
//! GET and DELETE requests carry `timestamp` and `hash` in the query string
//! and are signed over `{"hash":..,"timestamp":..}`. Requests with a body
//! carry both fields inside the JSON body and are signed over the whole body.

use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use cinema_common::api::{validate_hash, validate_timestamp, ApiAuthError, AuthQuery};
use serde_json::{json, Value};
use tracing::warn;

use crate::AppState;

/// Largest request body accepted by the back office
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Authentication middleware
///
/// Returns 401 when the timestamp or hash is wrong and 400 when the fields
/// are missing or unreadable. Applied to `/admin` routes only.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // secret = 0 disables all checking
    if state.shared_secret == 0 {
        return Ok(next.run(request).await);
    }

    let method = request.method();
    if method == Method::GET || method == Method::DELETE || method == Method::HEAD {
        let Query(auth) = Query::<AuthQuery>::try_from_uri(request.uri())
            .map_err(|e| AuthError::MissingFields(e.body_text()))?;

        check(auth.timestamp, &auth.hash, &auth.document(), state.shared_secret)?;
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| AuthError::ParseError(format!("Failed to read body: {}", e)))?;

    let document: Value = serde_json::from_slice(&body_bytes)
        .map_err(|e| AuthError::ParseError(format!("Invalid JSON: {}", e)))?;

    let auth: AuthQuery = serde_json::from_value(document.clone())
        .map_err(|e| AuthError::MissingFields(e.to_string()))?;

    check(auth.timestamp, &auth.hash, &document, state.shared_secret)?;

    // Handlers read the body again
    let request = Request::from_parts(parts, Body::from(body_bytes));
    Ok(next.run(request).await)
}

fn check(timestamp: i64, hash: &str, document: &Value, shared_secret: i64) -> Result<(), AuthError> {
    validate_timestamp(timestamp).map_err(|e| match e {
        ApiAuthError::InvalidTimestamp { reason, .. } => AuthError::InvalidTimestamp(reason),
        other => AuthError::Other(other.to_string()),
    })?;

    validate_hash(hash, document, shared_secret).map_err(|e| match e {
        ApiAuthError::InvalidHash { provided, calculated } => {
            warn!(
                "Hash validation failed: provided={}, calculated={}",
                provided, calculated
            );
            AuthError::InvalidHash
        }
        other => AuthError::Other(other.to_string()),
    })
}

/// Authentication failures as HTTP responses
#[derive(Debug)]
pub enum AuthError {
    InvalidTimestamp(String),
    InvalidHash,
    MissingFields(String),
    ParseError(String),
    Other(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthError::InvalidTimestamp(reason) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                format!("Invalid timestamp: {}", reason),
            ),
            AuthError::InvalidHash => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Invalid hash".to_string(),
            ),
            AuthError::MissingFields(msg) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                format!("Missing required fields: {}", msg),
            ),
            AuthError::ParseError(msg) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                format!("Parse error: {}", msg),
            ),
            AuthError::Other(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                format!("Authentication error: {}", msg),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
