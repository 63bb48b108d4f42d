use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use uuid::Uuid;

/// Uniform response body shared by every endpoint:
/// `{ status, message?, data?, id?, token }`.
///
/// `message`, `data`, and `id` are omitted from the JSON when unset;
/// `token` is always serialized (null when the caller presented no usable
/// credential). Construction goes through [`Envelope::with_data`] or
/// [`Envelope::with_message`], so a body without either cannot exist.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub token: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    /// Envelope carrying a data payload; status defaults to 200.
    pub fn with_data(data: T) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            message: None,
            data: Some(data),
            id: None,
            token: None,
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status.as_u16();
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }
}

impl Envelope<()> {
    /// Envelope carrying only a message; status defaults to 200.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            message: Some(message.into()),
            data: None,
            id: None,
            token: None,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, axum::Json(self)).into_response()
    }
}
