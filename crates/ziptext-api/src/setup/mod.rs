//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use crate::auth::JwtService;
use crate::services::ProjectService;
use crate::state::AppState;
use anyhow::Result;
use std::sync::Arc;
use ziptext_core::Config;
use ziptext_db::PgUploadRepository;
use ziptext_flatten::FlattenRules;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(config.is_production())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment,
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;
    let storage = storage::setup_storage(&config).await?;

    let projects = ProjectService::new(
        Arc::new(PgUploadRepository::new(pool.clone())),
        storage.clone(),
        FlattenRules::default(),
        config.max_upload_size_bytes,
    );

    let state = Arc::new(AppState {
        jwt: Arc::new(JwtService::new(&config.jwt_secret)),
        projects,
        storage,
        pool: Some(pool),
    });

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
