pub mod config;
pub mod database;
pub mod request_repository;
pub mod site_repository;
pub mod user_repository;

pub use config::DatabaseConfig;
pub use database::Database;
pub use request_repository::RequestRepository;
pub use site_repository::SiteRepository;
pub use user_repository::UserRepository;

use matreq_core::AppError;

/// Map a sqlx error into the application taxonomy.
///
/// Unique and foreign-key violations carry actionable client meaning; the
/// rest is opaque database failure.
pub(crate) fn db_err(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return AppError::Conflict("record violates a uniqueness constraint".to_string());
        }
        if db.is_foreign_key_violation() {
            return AppError::Validation("record references an unknown entity".to_string());
        }
    }
    AppError::Database(err.to_string())
}
