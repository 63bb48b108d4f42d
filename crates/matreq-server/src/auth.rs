use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use matreq_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Middleware that verifies an `Authorization: Bearer <jwt>` header.
///
/// Two terminal outcomes: a missing or malformed header rejects with 401
/// before any handler runs; a present token that fails signature or expiry
/// verification rejects with 403. On success the decoded [`Claims`] are
/// attached to the request extensions for handlers to read.
///
/// [`Claims`]: crate::token::Claims
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let Some(token) = bearer else {
        return ApiError(AppError::Unauthorized(
            "Access token missing or invalid".to_string(),
        ))
        .into_response();
    };

    match state.tokens.verify(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(err) => {
            tracing::warn!(error = %err, "bearer token rejected");
            ApiError(AppError::Forbidden(
                "Invalid or expired token".to_string(),
            ))
            .into_response()
        }
    }
}
