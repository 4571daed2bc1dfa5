//! Subcommand implementations.

pub mod analyze;
pub mod ask;
pub mod dashboard;
pub mod doctor;
pub mod import;
pub mod income;
pub mod onboard;

use std::sync::Arc;

use finpilot_config::AppConfig;
use finpilot_store::SqliteStore;

pub(crate) fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load().map_err(|e| format!("Failed to load config: {e}").into())
}

/// Open the SQLite store named by `config`, creating it if needed.
pub(crate) async fn open_store(
    config: &AppConfig,
) -> Result<Arc<SqliteStore>, Box<dyn std::error::Error>> {
    let path = config.store.path.to_string_lossy();
    let store = SqliteStore::open(&path)
        .await
        .map_err(|e| format!("Failed to open store at {}: {e}", config.store.path.display()))?;
    Ok(Arc::new(store))
}
