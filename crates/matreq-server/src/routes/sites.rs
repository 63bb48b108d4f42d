use std::sync::Arc;

use axum::Extension;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use matreq_core::authz;
use matreq_core::site::{
    NewSite, PurchaserAssignment, SitePatch, SiteStatus, SupervisorAssignment,
};

use crate::dto::{
    CreateSiteRequest, PurchaserAssignmentRequest, SiteResponse, SupervisorAssignmentRequest,
    UpdateSiteRequest,
};
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::routes::{non_empty, parse_opt, parse_or};
use crate::state::AppState;
use crate::token::{Claims, RollingToken};

fn supervisor_assignments(list: Vec<SupervisorAssignmentRequest>) -> Vec<SupervisorAssignment> {
    list.into_iter()
        .map(|s| SupervisorAssignment {
            user_id: s.user_id,
            status: s.status,
        })
        .collect()
}

fn purchaser_assignments(list: Vec<PurchaserAssignmentRequest>) -> Vec<PurchaserAssignment> {
    list.into_iter()
        .map(|p| PurchaserAssignment {
            user_id: p.user_id,
            status: p.status,
            material_type: p.material_type,
        })
        .collect()
}

#[utoipa::path(
    post,
    path = "/api/v1/site",
    request_body = CreateSiteRequest,
    responses(
        (status = 201, description = "Site created", body = SiteResponse),
        (status = 401, description = "No bearer token"),
        (status = 403, description = "Caller may not create sites"),
    ),
    security(("bearer" = [])),
    tag = "sites"
)]
pub async fn create_site(
    State(state): State<Arc<AppState>>,
    rolling: RollingToken,
    Extension(claims): Extension<Claims>,
    axum::Json(body): axum::Json<CreateSiteRequest>,
) -> Result<Response, ApiError> {
    // Role comes from the database, not the token, so a stale credential
    // cannot outlive a demotion.
    let actor = match state.db.user_repo().get(claims.sub).await? {
        Some(actor) if authz::authorize(actor.role, &authz::SITE_CREATE).is_ok() => actor,
        _ => {
            return Ok(Envelope::with_message("Only admins can create sites")
                .status(StatusCode::FORBIDDEN)
                .token(rolling.0)
                .into_response());
        }
    };

    non_empty("name", &body.name)?;
    non_empty("address", &body.address)?;
    let status = parse_or(body.status.as_deref(), SiteStatus::Active)?;

    let supervisors = supervisor_assignments(body.supervisors.unwrap_or_default());
    let purchasers = purchaser_assignments(body.purchasers.unwrap_or_default());

    let site = state
        .db
        .site_repo()
        .create(
            &NewSite {
                name: body.name,
                address: body.address,
                client_name: body.client_name,
                city: body.city,
                province: body.province,
                plot_size: body.plot_size,
                status,
                updated_by: Some(actor.id),
            },
            &supervisors,
            &purchasers,
        )
        .await?;

    let id = site.site.id;
    Ok(Envelope::with_data(SiteResponse::from(site))
        .status(StatusCode::CREATED)
        .message("Site created successfully")
        .id(id)
        .token(rolling.0)
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/v1/site",
    responses(
        (status = 200, description = "All sites with crew assignments", body = [SiteResponse]),
    ),
    tag = "sites"
)]
pub async fn list_sites(
    State(state): State<Arc<AppState>>,
    rolling: RollingToken,
) -> Result<Response, ApiError> {
    let sites = state.db.site_repo().list().await?;
    let data: Vec<SiteResponse> = sites.into_iter().map(Into::into).collect();

    Ok(Envelope::with_data(data)
        .message("Sites fetched successfully")
        .token(rolling.0)
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/v1/site/{id}",
    params(("id" = Uuid, Path, description = "Site ID")),
    responses(
        (status = 200, description = "Site details", body = SiteResponse),
        (status = 404, description = "Not found"),
    ),
    tag = "sites"
)]
pub async fn get_site(
    State(state): State<Arc<AppState>>,
    rolling: RollingToken,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    match state.db.site_repo().get(id).await? {
        Some(site) => Ok(Envelope::with_data(SiteResponse::from(site))
            .message("Site fetched successfully")
            .token(rolling.0)
            .into_response()),
        None => Ok(Envelope::with_message("Site not found")
            .status(StatusCode::NOT_FOUND)
            .token(rolling.0)
            .into_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/site/{id}",
    params(("id" = Uuid, Path, description = "Site ID")),
    request_body = UpdateSiteRequest,
    responses(
        (status = 200, description = "Site updated", body = SiteResponse),
        (status = 404, description = "Not found"),
    ),
    tag = "sites"
)]
pub async fn update_site(
    State(state): State<Arc<AppState>>,
    rolling: RollingToken,
    Path(id): Path<Uuid>,
    axum::Json(body): axum::Json<UpdateSiteRequest>,
) -> Result<Response, ApiError> {
    let patch = SitePatch {
        name: body.name,
        address: body.address,
        client_name: body.client_name,
        city: body.city,
        province: body.province,
        plot_size: body.plot_size,
        status: parse_opt(body.status.as_deref())?,
        updated_by: body.updated_by,
    };

    let supervisors = body.supervisors.map(supervisor_assignments);
    let purchasers = body.purchasers.map(purchaser_assignments);

    let updated = state
        .db
        .site_repo()
        .update(id, &patch, supervisors.as_deref(), purchasers.as_deref())
        .await?;

    match updated {
        Some(site) => Ok(Envelope::with_data(SiteResponse::from(site))
            .message("Site updated successfully")
            .token(rolling.0)
            .into_response()),
        None => Ok(Envelope::with_message("Site not found")
            .status(StatusCode::NOT_FOUND)
            .token(rolling.0)
            .into_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/site/{id}",
    params(("id" = Uuid, Path, description = "Site ID")),
    responses(
        (status = 200, description = "Site deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Site still has material requests"),
    ),
    tag = "sites"
)]
pub async fn delete_site(
    State(state): State<Arc<AppState>>,
    rolling: RollingToken,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    if state.db.site_repo().delete(id).await? {
        Ok(Envelope::with_message("Site deleted successfully")
            .token(rolling.0)
            .into_response())
    } else {
        Ok(Envelope::with_message("Site not found")
            .status(StatusCode::NOT_FOUND)
            .token(rolling.0)
            .into_response())
    }
}
