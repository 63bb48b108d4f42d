use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use matreq_core::request::{DepartmentCard, HistoryEntry, RequestDetail};
use matreq_core::site::{PurchaserOnSite, Site, SiteWithCrew, SupervisorOnSite};
use matreq_core::user::User;

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// One of: admin, supervisor, purchaser, accounts, qa. Defaults to supervisor.
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Public view of a user — the password hash never leaves the server.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role.to_string(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Sites
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SupervisorAssignmentRequest {
    pub user_id: Uuid,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PurchaserAssignmentRequest {
    pub user_id: Uuid,
    pub status: Option<String>,
    pub material_type: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateSiteRequest {
    pub name: String,
    pub address: String,
    pub client_name: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub plot_size: Option<String>,
    /// One of: active, on_hold, completed. Defaults to active.
    pub status: Option<String>,
    pub supervisors: Option<Vec<SupervisorAssignmentRequest>>,
    pub purchasers: Option<Vec<PurchaserAssignmentRequest>>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateSiteRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub client_name: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub plot_size: Option<String>,
    pub status: Option<String>,
    pub updated_by: Option<Uuid>,
    /// When given, replaces the existing supervisor assignments wholesale.
    pub supervisors: Option<Vec<SupervisorAssignmentRequest>>,
    /// When given, replaces the existing purchaser assignments wholesale.
    pub purchasers: Option<Vec<PurchaserAssignmentRequest>>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SupervisorResponse {
    pub id: Uuid,
    pub status: Option<String>,
    pub user: UserResponse,
}

impl From<SupervisorOnSite> for SupervisorResponse {
    fn from(s: SupervisorOnSite) -> Self {
        Self {
            id: s.id,
            status: s.status,
            user: s.user.into(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PurchaserResponse {
    pub id: Uuid,
    pub status: Option<String>,
    pub material_type: Option<String>,
    pub user: UserResponse,
}

impl From<PurchaserOnSite> for PurchaserResponse {
    fn from(p: PurchaserOnSite) -> Self {
        Self {
            id: p.id,
            status: p.status,
            material_type: p.material_type,
            user: p.user.into(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SiteResponse {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub client_name: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub plot_size: Option<String>,
    pub status: String,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub supervisors: Vec<SupervisorResponse>,
    pub purchasers: Vec<PurchaserResponse>,
}

impl From<SiteWithCrew> for SiteResponse {
    fn from(s: SiteWithCrew) -> Self {
        Self {
            id: s.site.id,
            name: s.site.name,
            address: s.site.address,
            client_name: s.site.client_name,
            city: s.site.city,
            province: s.site.province,
            plot_size: s.site.plot_size,
            status: s.site.status.to_string(),
            updated_by: s.site.updated_by,
            created_at: s.site.created_at,
            updated_at: s.site.updated_at,
            supervisors: s.supervisors.into_iter().map(Into::into).collect(),
            purchasers: s.purchasers.into_iter().map(Into::into).collect(),
        }
    }
}

/// Compact site view embedded in material-request responses.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SiteSummaryResponse {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub city: Option<String>,
    pub status: String,
}

impl From<Site> for SiteSummaryResponse {
    fn from(site: Site) -> Self {
        Self {
            id: site.id,
            name: site.name,
            address: site.address,
            city: site.city,
            status: site.status.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Material requests
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct DepartmentCardRequest {
    /// One of: supervisor, purchaser, accounts, qa.
    pub department: String,
    /// One of: pending, approved, rejected. Defaults to pending.
    pub status: Option<String>,
    pub comments: Option<String>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct HistoryEntryRequest {
    /// One of: supervisor, purchaser, accounts, qa.
    pub department: String,
    pub user_id: Option<Uuid>,
    /// Defaults to the server clock.
    pub received_at: Option<DateTime<Utc>>,
    pub forwarded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateRequestBody {
    pub site_id: Uuid,
    pub material_name: String,
    pub unit: String,
    pub released_qty: Option<f64>,
    pub comments: Option<String>,
    /// One of: pending, in_progress, approved, rejected, fulfilled.
    pub status: Option<String>,
    /// Department currently holding the request.
    pub current_department: Option<String>,
    pub departments: Option<Vec<DepartmentCardRequest>>,
    pub history: Option<Vec<HistoryEntryRequest>>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateRequestBody {
    pub material_name: Option<String>,
    pub unit: Option<String>,
    pub released_qty: Option<f64>,
    pub comments: Option<String>,
    pub status: Option<String>,
    pub current_department: Option<String>,
    /// Upserted per department.
    pub departments: Option<Vec<DepartmentCardRequest>>,
    /// Appended to the hand-off log.
    pub history: Option<Vec<HistoryEntryRequest>>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DepartmentCardResponse {
    pub id: Uuid,
    pub department: String,
    pub status: String,
    pub comments: Option<String>,
    pub user_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl From<DepartmentCard> for DepartmentCardResponse {
    fn from(card: DepartmentCard) -> Self {
        Self {
            id: card.id,
            department: card.department.to_string(),
            status: card.status.to_string(),
            comments: card.comments,
            user_id: card.user_id,
            updated_at: card.updated_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HistoryEntryResponse {
    pub id: Uuid,
    pub department: String,
    pub user_id: Option<Uuid>,
    pub received_at: DateTime<Utc>,
    pub forwarded_at: Option<DateTime<Utc>>,
}

impl From<HistoryEntry> for HistoryEntryResponse {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            id: entry.id,
            department: entry.department.to_string(),
            user_id: entry.user_id,
            received_at: entry.received_at,
            forwarded_at: entry.forwarded_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RequestResponse {
    pub id: Uuid,
    pub site: SiteSummaryResponse,
    pub material_name: String,
    pub unit: String,
    pub released_qty: f64,
    pub comments: Option<String>,
    pub status: String,
    pub current_department: String,
    pub departments: Vec<DepartmentCardResponse>,
    pub history: Vec<HistoryEntryResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RequestDetail> for RequestResponse {
    fn from(detail: RequestDetail) -> Self {
        Self {
            id: detail.request.id,
            site: detail.site.into(),
            material_name: detail.request.material_name,
            unit: detail.request.unit,
            released_qty: detail.request.released_qty,
            comments: detail.request.comments,
            status: detail.request.status.to_string(),
            current_department: detail.request.current_department.to_string(),
            departments: detail.departments.into_iter().map(Into::into).collect(),
            history: detail.history.into_iter().map(Into::into).collect(),
            created_at: detail.request.created_at,
            updated_at: detail.request.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}
