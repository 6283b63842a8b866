use std::path::Path;

use slate_core::config::{DatabaseConfig, SlateConfig, SlateSection};
use slate_core::db::DatabasePool;
use tracing::info;

/// Run the `init` command: create data directory, write default config, and set up the database.
pub async fn run(data_dir: &str) -> anyhow::Result<()> {
    let data_path = Path::new(data_dir);

    if !data_path.exists() {
        std::fs::create_dir_all(data_path)?;
        info!("Created data directory: {}", data_dir);
    }

    let db_path = data_path.join("slate.db");
    let db_path_str = db_path.to_string_lossy().to_string();

    let defaults = SlateConfig::generate_default();
    let config = SlateConfig {
        slate: SlateSection {
            instance_name: "My School".into(),
            data_dir: data_dir.to_string(),
            database: DatabaseConfig {
                path: Some(db_path_str.clone()),
            },
        },
        ..defaults
    };

    let config_path = data_path.join("slate.toml");
    let toml_str = toml::to_string_pretty(&config)?;
    std::fs::write(&config_path, &toml_str)?;
    info!("Wrote configuration to {}", config_path.display());

    let connect_str = format!("sqlite:{}?mode=rwc", db_path_str);
    DatabasePool::new_sqlite(&connect_str).await?;
    info!("Database initialized at {}", db_path_str);

    println!("Slate initialized successfully!");
    println!("  Data directory: {}", data_dir);
    println!("  Configuration:  {}", config_path.display());
    println!("  Database:       {}", db_path_str);
    println!();
    println!("Next steps:");
    println!(
        "  1. Set [powerschool] endpoint, client_id and client_secret in {}",
        config_path.display()
    );
    println!("  2. Run `slate sync schools` to check the connection");
    println!("  3. Run `slate sync` to pull everything");

    Ok(())
}
