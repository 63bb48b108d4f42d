use thiserror::Error;

/// Application-wide error types for matreq.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request payload failed a shape or content check.
    #[error("{0}")]
    Validation(String),

    /// Entity lookup missed.
    #[error("{0}")]
    NotFound(String),

    /// Missing or unusable credential.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not permitted.
    #[error("{0}")]
    Forbidden(String),

    /// The operation collides with existing state (duplicate email,
    /// dangling references).
    #[error("{0}")]
    Conflict(String),

    /// Token signing or verification failed.
    #[error("token error: {0}")]
    Token(String),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// JSON serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// True when the message is safe to surface to the client verbatim.
    ///
    /// Everything else is logged server-side and replaced with a generic
    /// message before it reaches the wire.
    pub fn is_client_facing(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::NotFound(_)
                | AppError::Unauthorized(_)
                | AppError::Forbidden(_)
                | AppError::Conflict(_)
        )
    }
}

impl From<crate::authz::AuthzError> for AppError {
    fn from(err: crate::authz::AuthzError) -> Self {
        AppError::Forbidden(err.to_string())
    }
}
