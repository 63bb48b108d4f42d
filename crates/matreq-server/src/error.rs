use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use matreq_core::error::AppError;

use crate::envelope::Envelope;

/// Wrapper so we can implement `IntoResponse` for `AppError`.
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal detail is logged, never sent to the client.
        let message = if self.0.is_client_facing() {
            self.0.to_string()
        } else {
            tracing::error!(error = %self.0, "request failed");
            "Internal Server Error".to_string()
        };

        Envelope::with_message(message).status(status).into_response()
    }
}
