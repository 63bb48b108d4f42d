use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::site::Site;

/// Department a material request can sit with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Supervisor,
    Purchaser,
    Accounts,
    Qa,
}

impl Department {
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Supervisor => "supervisor",
            Department::Purchaser => "purchaser",
            Department::Accounts => "accounts",
            Department::Qa => "qa",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Department {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "supervisor" => Ok(Department::Supervisor),
            "purchaser" => Ok(Department::Purchaser),
            "accounts" => Ok(Department::Accounts),
            "qa" => Ok(Department::Qa),
            _ => Err(format!("Unknown department: {}", s)),
        }
    }
}

/// Overall status of a material request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Pending,
    InProgress,
    Approved,
    Rejected,
    Fulfilled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Fulfilled => "fulfilled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Rejected | RequestStatus::Fulfilled)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(RequestStatus::Pending),
            "in_progress" => Ok(RequestStatus::InProgress),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            "fulfilled" => Ok(RequestStatus::Fulfilled),
            _ => Err(format!("Unknown request status: {}", s)),
        }
    }
}

/// Verdict a department records on its card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::Pending => "pending",
            CardStatus::Approved => "approved",
            CardStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CardStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(CardStatus::Pending),
            "approved" => Ok(CardStatus::Approved),
            "rejected" => Ok(CardStatus::Rejected),
            _ => Err(format!("Unknown card status: {}", s)),
        }
    }
}

/// A request for material release against a site.
#[derive(Debug, Clone, Serialize)]
pub struct MaterialRequest {
    pub id: Uuid,
    pub site_id: Uuid,
    pub material_name: String,
    pub unit: String,
    pub released_qty: f64,
    pub comments: Option<String>,
    pub status: RequestStatus,
    pub current_department: Department,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for inserting a new material request.
#[derive(Debug, Clone)]
pub struct NewMaterialRequest {
    pub site_id: Uuid,
    pub material_name: String,
    pub unit: String,
    pub released_qty: f64,
    pub comments: Option<String>,
    pub status: RequestStatus,
    pub current_department: Department,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct RequestPatch {
    pub material_name: Option<String>,
    pub unit: Option<String>,
    pub released_qty: Option<f64>,
    pub comments: Option<String>,
    pub status: Option<RequestStatus>,
    pub current_department: Option<Department>,
}

/// Per-department sub-record owned by one request.
///
/// At most one card exists per (request, department) pair.
#[derive(Debug, Clone, Serialize)]
pub struct DepartmentCard {
    pub id: Uuid,
    pub request_id: Uuid,
    pub department: Department,
    pub status: CardStatus,
    pub comments: Option<String>,
    pub user_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating or upserting a department card.
#[derive(Debug, Clone)]
pub struct NewDepartmentCard {
    pub department: Department,
    pub status: CardStatus,
    pub comments: Option<String>,
    pub user_id: Option<Uuid>,
}

/// Append-only hand-off log entry for a request.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub request_id: Uuid,
    pub department: Department,
    pub user_id: Option<Uuid>,
    pub received_at: DateTime<Utc>,
    pub forwarded_at: Option<DateTime<Utc>>,
}

/// DTO for appending a history entry. `received_at` defaults to NOW().
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub department: Department,
    pub user_id: Option<Uuid>,
    pub received_at: Option<DateTime<Utc>>,
    pub forwarded_at: Option<DateTime<Utc>>,
}

/// A request together with its site, cards, and history, as served by
/// read endpoints.
#[derive(Debug, Clone)]
pub struct RequestDetail {
    pub request: MaterialRequest,
    pub site: Site,
    pub departments: Vec<DepartmentCard>,
    pub history: Vec<HistoryEntry>,
}
