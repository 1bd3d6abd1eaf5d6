//! Application state shared by all handlers.

use crate::auth::JwtService;
use crate::services::ProjectService;
use sqlx::PgPool;
use std::sync::Arc;
use ziptext_storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub projects: ProjectService,
    pub storage: Arc<dyn Storage>,
    pub jwt: Arc<JwtService>,
    /// None when records are kept in memory instead of PostgreSQL.
    pub pool: Option<PgPool>,
}
