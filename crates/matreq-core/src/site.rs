use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::User;

/// Lifecycle status of a construction site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SiteStatus {
    #[default]
    Active,
    OnHold,
    Completed,
}

impl SiteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteStatus::Active => "active",
            SiteStatus::OnHold => "on_hold",
            SiteStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SiteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(SiteStatus::Active),
            "on_hold" => Ok(SiteStatus::OnHold),
            "completed" => Ok(SiteStatus::Completed),
            _ => Err(format!("Unknown site status: {}", s)),
        }
    }
}

/// A construction site.
#[derive(Debug, Clone, Serialize)]
pub struct Site {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub client_name: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub plot_size: Option<String>,
    pub status: SiteStatus,
    /// User who last touched the record.
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for inserting a new site.
#[derive(Debug, Clone)]
pub struct NewSite {
    pub name: String,
    pub address: String,
    pub client_name: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub plot_size: Option<String>,
    pub status: SiteStatus,
    pub updated_by: Option<Uuid>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct SitePatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub client_name: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub plot_size: Option<String>,
    pub status: Option<SiteStatus>,
    pub updated_by: Option<Uuid>,
}

/// A supervisor to attach to a site.
#[derive(Debug, Clone)]
pub struct SupervisorAssignment {
    pub user_id: Uuid,
    pub status: Option<String>,
}

/// A purchaser to attach to a site, optionally scoped to a material type.
#[derive(Debug, Clone)]
pub struct PurchaserAssignment {
    pub user_id: Uuid,
    pub status: Option<String>,
    pub material_type: Option<String>,
}

/// A supervisor assignment joined with the user's details.
#[derive(Debug, Clone)]
pub struct SupervisorOnSite {
    pub id: Uuid,
    pub status: Option<String>,
    pub user: User,
}

/// A purchaser assignment joined with the user's details.
#[derive(Debug, Clone)]
pub struct PurchaserOnSite {
    pub id: Uuid,
    pub status: Option<String>,
    pub material_type: Option<String>,
    pub user: User,
}

/// A site together with its crew assignments, as served by read endpoints.
#[derive(Debug, Clone)]
pub struct SiteWithCrew {
    pub site: Site,
    pub supervisors: Vec<SupervisorOnSite>,
    pub purchasers: Vec<PurchaserOnSite>,
}
