use crate::db::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Page size used when the request does not supply `per_page`.
    pub default_per_page: i64,
}

impl AppState {
    pub fn new(db: Database, default_per_page: i64) -> Self {
        Self {
            db,
            default_per_page,
        }
    }
}
