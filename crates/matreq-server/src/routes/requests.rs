use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use matreq_core::error::AppError;
use matreq_core::request::{
    CardStatus, Department, NewDepartmentCard, NewHistoryEntry, NewMaterialRequest, RequestPatch,
    RequestStatus,
};

use crate::dto::{
    CreateRequestBody, DepartmentCardRequest, HistoryEntryRequest, RequestResponse,
    UpdateRequestBody,
};
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::routes::{non_empty, parse_opt, parse_or};
use crate::state::AppState;
use crate::token::RollingToken;

fn department_cards(list: Vec<DepartmentCardRequest>) -> Result<Vec<NewDepartmentCard>, AppError> {
    list.into_iter()
        .map(|card| {
            Ok(NewDepartmentCard {
                department: card
                    .department
                    .parse::<Department>()
                    .map_err(AppError::Validation)?,
                status: parse_or(card.status.as_deref(), CardStatus::Pending)?,
                comments: card.comments,
                user_id: card.user_id,
            })
        })
        .collect()
}

fn history_entries(list: Vec<HistoryEntryRequest>) -> Result<Vec<NewHistoryEntry>, AppError> {
    list.into_iter()
        .map(|entry| {
            Ok(NewHistoryEntry {
                department: entry
                    .department
                    .parse::<Department>()
                    .map_err(AppError::Validation)?,
                user_id: entry.user_id,
                received_at: entry.received_at,
                forwarded_at: entry.forwarded_at,
            })
        })
        .collect()
}

#[utoipa::path(
    post,
    path = "/api/v1/request",
    request_body = CreateRequestBody,
    responses(
        (status = 201, description = "Request created", body = RequestResponse),
        (status = 404, description = "Site not found"),
    ),
    tag = "requests"
)]
pub async fn create_request(
    State(state): State<Arc<AppState>>,
    rolling: RollingToken,
    axum::Json(body): axum::Json<CreateRequestBody>,
) -> Result<Response, ApiError> {
    non_empty("material_name", &body.material_name)?;
    non_empty("unit", &body.unit)?;

    if !state.db.site_repo().exists(body.site_id).await? {
        return Ok(Envelope::with_message("Site not found")
            .status(StatusCode::NOT_FOUND)
            .token(rolling.0)
            .into_response());
    }

    let status = parse_or(body.status.as_deref(), RequestStatus::Pending)?;
    let current_department =
        parse_or(body.current_department.as_deref(), Department::Supervisor)?;
    let cards = department_cards(body.departments.unwrap_or_default())?;
    let history = history_entries(body.history.unwrap_or_default())?;

    let detail = state
        .db
        .request_repo()
        .create(
            &NewMaterialRequest {
                site_id: body.site_id,
                material_name: body.material_name,
                unit: body.unit,
                released_qty: body.released_qty.unwrap_or(0.0),
                comments: body.comments,
                status,
                current_department,
            },
            &cards,
            &history,
        )
        .await?;

    let id = detail.request.id;
    Ok(Envelope::with_data(RequestResponse::from(detail))
        .status(StatusCode::CREATED)
        .message("Request created successfully")
        .id(id)
        .token(rolling.0)
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/v1/request",
    responses(
        (status = 200, description = "All requests with site, cards, and history", body = [RequestResponse]),
    ),
    tag = "requests"
)]
pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    rolling: RollingToken,
) -> Result<Response, ApiError> {
    let requests = state.db.request_repo().list().await?;
    let data: Vec<RequestResponse> = requests.into_iter().map(Into::into).collect();

    Ok(Envelope::with_data(data).token(rolling.0).into_response())
}

#[utoipa::path(
    get,
    path = "/api/v1/request/{id}",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request details", body = RequestResponse),
        (status = 404, description = "Not found"),
    ),
    tag = "requests"
)]
pub async fn get_request(
    State(state): State<Arc<AppState>>,
    rolling: RollingToken,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    match state.db.request_repo().get(id).await? {
        Some(detail) => Ok(Envelope::with_data(RequestResponse::from(detail))
            .token(rolling.0)
            .into_response()),
        None => Ok(Envelope::with_message("Request not found")
            .status(StatusCode::NOT_FOUND)
            .token(rolling.0)
            .into_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/request/{id}",
    params(("id" = Uuid, Path, description = "Request ID")),
    request_body = UpdateRequestBody,
    responses(
        (status = 200, description = "Request updated", body = RequestResponse),
        (status = 404, description = "Not found"),
    ),
    tag = "requests"
)]
pub async fn update_request(
    State(state): State<Arc<AppState>>,
    rolling: RollingToken,
    Path(id): Path<Uuid>,
    axum::Json(body): axum::Json<UpdateRequestBody>,
) -> Result<Response, ApiError> {
    let patch = RequestPatch {
        material_name: body.material_name,
        unit: body.unit,
        released_qty: body.released_qty,
        comments: body.comments,
        status: parse_opt(body.status.as_deref())?,
        current_department: parse_opt(body.current_department.as_deref())?,
    };
    let cards = department_cards(body.departments.unwrap_or_default())?;
    let history = history_entries(body.history.unwrap_or_default())?;

    match state
        .db
        .request_repo()
        .update(id, &patch, &cards, &history)
        .await?
    {
        Some(detail) => Ok(Envelope::with_data(RequestResponse::from(detail))
            .message("Request updated")
            .token(rolling.0)
            .into_response()),
        None => Ok(Envelope::with_message("Request not found")
            .status(StatusCode::NOT_FOUND)
            .token(rolling.0)
            .into_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/request/{id}",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request and its sub-records deleted"),
        (status = 404, description = "Not found"),
    ),
    tag = "requests"
)]
pub async fn delete_request(
    State(state): State<Arc<AppState>>,
    rolling: RollingToken,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    if state.db.request_repo().delete(id).await? {
        Ok(Envelope::with_message("Request deleted")
            .token(rolling.0)
            .into_response())
    } else {
        Ok(Envelope::with_message("Request not found")
            .status(StatusCode::NOT_FOUND)
            .token(rolling.0)
            .into_response())
    }
}
