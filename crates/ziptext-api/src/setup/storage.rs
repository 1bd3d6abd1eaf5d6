//! Storage setup and initialization

use anyhow::{Context, Result};
use std::sync::Arc;
use ziptext_core::Config;
use ziptext_storage::{LocalStorage, Storage};

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!(
        path = %config.local_storage_path,
        "Initializing local storage..."
    );
    let storage = LocalStorage::new(config.local_storage_path.as_str())
        .await
        .context("Failed to initialize local storage")?;

    Ok(Arc::new(storage))
}
