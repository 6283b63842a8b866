use slate_core::db::repository::{SyncJobRepository, TermRepository};
use slate_core::models::sync::EntityType;
use tracing::info;

use super::{load_config, open_repository};

/// Run the `status` command: show the latest sync job per entity and the current term.
pub async fn run(config_path: &str) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let repo = open_repository(&config).await?;

    let db_size = config
        .slate
        .database
        .path
        .as_deref()
        .and_then(|path| std::fs::metadata(path).ok())
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|| "unknown".to_string());

    println!("Slate Status");
    println!("============");
    println!("Instance: {}", config.slate.instance_name);
    println!("Database: SQLite ({})", db_size);
    println!(
        "Upstream: {}",
        config
            .powerschool
            .endpoint
            .as_deref()
            .unwrap_or("(not configured)")
    );
    println!();

    println!("Last Sync per Entity");
    println!("--------------------");
    for entity in EntityType::ALL {
        match repo.get_latest_sync_job(entity).await? {
            Some(job) => {
                let finished = if job.status.is_terminal() {
                    job.completed_at
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                        .unwrap_or_else(|| "-".to_string())
                } else {
                    "in progress".to_string()
                };
                println!(
                    "{:<10} {:<10} {:>6} records  {}",
                    entity.as_str(),
                    format!("{:?}", job.status).to_lowercase(),
                    job.record_count,
                    finished
                );
                if let Some(ref err) = job.error_message {
                    println!("{:<10} error: {}", "", err);
                }
            }
            None => println!("{:<10} never synced", entity.as_str()),
        }
    }
    println!();

    match repo.get_current_term().await? {
        Some(term) => println!(
            "Current term: {} ({} to {})",
            term.name, term.first_day, term.last_day
        ),
        None => println!("Current term: none"),
    }

    info!("Status reported");
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_displays_correctly() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1048576), "1.0 MB");
        assert_eq!(format_bytes(1073741824), "1.0 GB");
    }

    #[tokio::test]
    async fn status_runs_on_fresh_install() {
        let temp_dir = std::env::temp_dir().join("slate_test_status");
        let _ = std::fs::remove_dir_all(&temp_dir);
        let data_dir = temp_dir.to_string_lossy().to_string();
        crate::commands::init::run(&data_dir).await.unwrap();

        let config_path = temp_dir.join("slate.toml");
        run(&config_path.to_string_lossy()).await.unwrap();

        let _ = std::fs::remove_dir_all(&temp_dir);
    }

    #[tokio::test]
    async fn status_requires_config_file() {
        assert!(run("/nonexistent/slate.toml").await.is_err());
    }
}
