use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use matreq_core::error::AppError;
use matreq_core::user::{Role, User};

use crate::state::AppState;

/// Lifetime of a token issued at login, in days.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Lifetime of the rolling token re-issued with every response, in minutes.
pub const REFRESH_TTL_MINUTES: i64 = 10;

/// Claims carried in every signed token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// HMAC signing and verification keys for JWT operations.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a 7-day session token for a freshly authenticated user.
    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        self.sign(user.id, &user.email, user.role, TimeDelta::days(SESSION_TTL_DAYS))
    }

    /// Verify signature and expiry, returning the claims on success.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AppError::Token(e.to_string()))
    }

    /// Re-issue a short-lived token from a verified credential.
    ///
    /// The inbound token must pass full signature and expiry verification
    /// before its claims are re-signed with a fresh 10-minute window.
    pub fn refresh(&self, token: &str) -> Result<String, AppError> {
        let claims = self.verify(token)?;
        self.sign(
            claims.sub,
            &claims.email,
            claims.role,
            TimeDelta::minutes(REFRESH_TTL_MINUTES),
        )
    }

    fn sign(&self, sub: Uuid, email: &str, role: Role, ttl: TimeDelta) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub,
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Token(e.to_string()))
    }
}

/// Fresh short-lived token re-signed from the request's bearer credential.
///
/// Resolves to `None` when the header is absent, malformed, or fails
/// verification — a bad inbound token never fails the response pipeline.
pub struct RollingToken(pub Option<String>);

impl FromRequestParts<Arc<AppState>> for RollingToken {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let refreshed = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            // some clients send the literal string "undefined"
            .filter(|t| *t != "undefined")
            .and_then(|t| state.tokens.refresh(t).ok());

        Ok(Self(refreshed))
    }
}
