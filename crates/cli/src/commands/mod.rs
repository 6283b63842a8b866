pub mod init;
pub mod serve;
pub mod status;
pub mod sync;

use std::path::Path;

use slate_core::config::SlateConfig;
use slate_core::db::sqlite::SqliteRepository;
use slate_core::db::DatabasePool;
use tracing::info;

/// Load and validate the configuration file.
pub fn load_config(config_path: &str) -> anyhow::Result<SlateConfig> {
    let config = SlateConfig::load(Path::new(config_path))?;
    config.validate()?;
    info!("Loaded configuration from {}", config_path);
    Ok(config)
}

/// Open the configured SQLite database, creating it if needed.
pub async fn open_repository(config: &SlateConfig) -> anyhow::Result<SqliteRepository> {
    let path = config
        .slate
        .database
        .path
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("SQLite path not configured"))?;
    let connect_str = format!("sqlite:{}?mode=rwc", path);
    let pool = DatabasePool::new_sqlite(&connect_str).await?;
    let DatabasePool::Sqlite(pool) = pool;
    Ok(SqliteRepository::new(pool))
}
