use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use matreq_core::AppError;

use crate::auth::require_auth;
use crate::openapi::ApiDoc;
use crate::state::AppState;

pub mod requests;
pub mod sites;
pub mod system;
pub mod users;

/// Build the full router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let user_routes = Router::new()
        .route("/", post(users::create_user).get(users::list_users))
        .route("/login", post(users::login))
        .route(
            "/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        );

    // Site creation is the only token-gated operation; the middleware wraps
    // just that method so the rest of the surface stays open.
    let site_routes = Router::new()
        .route(
            "/",
            get(sites::list_sites).merge(
                post(sites::create_site)
                    .layer(middleware::from_fn_with_state(state.clone(), require_auth)),
            ),
        )
        .route(
            "/{id}",
            get(sites::get_site)
                .put(sites::update_site)
                .delete(sites::delete_site),
        );

    let request_routes = Router::new()
        .route(
            "/",
            post(requests::create_request).get(requests::list_requests),
        )
        .route(
            "/{id}",
            get(requests::get_request)
                .put(requests::update_request)
                .delete(requests::delete_request),
        );

    let api = Router::new()
        .nest("/user", user_routes)
        .nest("/site", site_routes)
        .nest("/request", request_routes);

    let public = Router::new()
        .route("/health", get(system::health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.nest("/api/v1", api).with_state(state)
}

// ---------------------------------------------------------------------------
// Shared handler helpers
// ---------------------------------------------------------------------------

/// Reject blank required fields with a 400.
pub(crate) fn non_empty(field: &'static str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        Err(AppError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

/// Parse an optional string field, falling back to a default.
pub(crate) fn parse_or<T>(raw: Option<&str>, default: T) -> Result<T, AppError>
where
    T: FromStr<Err = String>,
{
    match raw {
        Some(s) => s.parse::<T>().map_err(AppError::Validation),
        None => Ok(default),
    }
}

/// Parse an optional string field, keeping `None` as `None`.
pub(crate) fn parse_opt<T>(raw: Option<&str>) -> Result<Option<T>, AppError>
where
    T: FromStr<Err = String>,
{
    raw.map(|s| s.parse::<T>().map_err(AppError::Validation))
        .transpose()
}
