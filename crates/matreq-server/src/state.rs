use matreq_db::Database;

use crate::token::TokenKeys;

/// Shared application state, available to all route handlers via
/// `State<Arc<AppState>>`.
pub struct AppState {
    pub db: Database,
    pub tokens: TokenKeys,
}
