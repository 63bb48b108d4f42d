use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use matreq_core::error::AppError;
use matreq_core::user::{NewUser, Role, UserPatch};

use crate::dto::{CreateUserRequest, LoginRequest, UpdateUserRequest, UserResponse};
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::routes::{non_empty, parse_opt, parse_or};
use crate::state::AppState;
use crate::token::RollingToken;

#[utoipa::path(
    post,
    path = "/api/v1/user",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email already registered"),
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    rolling: RollingToken,
    axum::Json(body): axum::Json<CreateUserRequest>,
) -> Result<Response, ApiError> {
    non_empty("name", &body.name)?;
    non_empty("email", &body.email)?;
    non_empty("password", &body.password)?;
    let role = parse_or(body.role.as_deref(), Role::Supervisor)?;

    let password_hash = bcrypt::hash(&body.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Generic(format!("password hashing failed: {e}")))?;

    let user = state
        .db
        .user_repo()
        .create(&NewUser {
            name: body.name,
            email: body.email,
            password_hash,
            role,
        })
        .await?;

    let id = user.id;
    Ok(Envelope::with_data(UserResponse::from(user))
        .status(StatusCode::CREATED)
        .message("User created successfully")
        .id(id)
        .token(rolling.0)
        .into_response())
}

#[utoipa::path(
    post,
    path = "/api/v1/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated; envelope token holds a 7-day JWT", body = UserResponse),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "users"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let Some(user) = state.db.user_repo().find_by_email(&body.email).await? else {
        return Ok(rejected_login());
    };

    let valid = bcrypt::verify(&body.password, &user.password_hash).unwrap_or(false);
    if !valid {
        return Ok(rejected_login());
    }

    let token = state.tokens.issue(&user)?;
    Ok(Envelope::with_data(UserResponse::from(user))
        .message("Login successful")
        .token(Some(token))
        .into_response())
}

/// 401 with no token in the body, whichever credential check failed.
fn rejected_login() -> Response {
    Envelope::with_message("Invalid email or password")
        .status(StatusCode::UNAUTHORIZED)
        .into_response()
}

#[utoipa::path(
    get,
    path = "/api/v1/user",
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    rolling: RollingToken,
) -> Result<Response, ApiError> {
    let users = state.db.user_repo().list().await?;
    let data: Vec<UserResponse> = users.into_iter().map(Into::into).collect();

    Ok(Envelope::with_data(data).token(rolling.0).into_response())
}

#[utoipa::path(
    get,
    path = "/api/v1/user/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 404, description = "Not found"),
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    rolling: RollingToken,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    match state.db.user_repo().get(id).await? {
        Some(user) => Ok(Envelope::with_data(UserResponse::from(user))
            .token(rolling.0)
            .into_response()),
        None => Ok(Envelope::with_message("User not found")
            .status(StatusCode::NOT_FOUND)
            .token(rolling.0)
            .into_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/user/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "Not found"),
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    rolling: RollingToken,
    Path(id): Path<Uuid>,
    axum::Json(body): axum::Json<UpdateUserRequest>,
) -> Result<Response, ApiError> {
    let password_hash = match body.password.as_deref() {
        Some(password) => {
            non_empty("password", password)?;
            Some(
                bcrypt::hash(password, bcrypt::DEFAULT_COST)
                    .map_err(|e| AppError::Generic(format!("password hashing failed: {e}")))?,
            )
        }
        None => None,
    };

    let patch = UserPatch {
        name: body.name,
        email: body.email,
        password_hash,
        role: parse_opt(body.role.as_deref())?,
    };

    match state.db.user_repo().update(id, &patch).await? {
        Some(user) => Ok(Envelope::with_data(UserResponse::from(user))
            .message("User updated")
            .token(rolling.0)
            .into_response()),
        None => Ok(Envelope::with_message("User not found")
            .status(StatusCode::NOT_FOUND)
            .token(rolling.0)
            .into_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/user/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "Not found"),
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    rolling: RollingToken,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    if state.db.user_repo().delete(id).await? {
        Ok(Envelope::with_message("User deleted")
            .token(rolling.0)
            .into_response())
    } else {
        Ok(Envelope::with_message("User not found")
            .status(StatusCode::NOT_FOUND)
            .token(rolling.0)
            .into_response())
    }
}
