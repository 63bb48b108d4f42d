pub mod authz;
pub mod error;
pub mod request;
pub mod site;
pub mod user;

pub use error::AppError;
pub use request::{Department, MaterialRequest, RequestDetail, RequestStatus};
pub use site::{Site, SiteStatus, SiteWithCrew};
pub use user::{Role, User};
