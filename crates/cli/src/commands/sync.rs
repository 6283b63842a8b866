use std::time::Instant;

use slate_core::config::SlateConfig;
use slate_core::db::repository::CredentialStore;
use slate_core::db::sqlite::SqliteRepository;
use slate_core::models::sync::{EntityType, SyncResult};
use slate_core::sync::{sync_all, sync_entity};
use tracing::{error, info, warn};

use super::{load_config, open_repository};

/// Run the `sync` command: seed credentials from config and sync one or all entity types.
pub async fn run(config_path: &str, entity: &str) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let repo = open_repository(&config).await?;
    info!("Connected to database");

    seed_credential(&repo, &config).await?;

    let settings = config.sync_settings();
    let start = Instant::now();

    let outcome = if entity == "all" {
        println!("Starting sync of all entity types...");
        sync_all(&repo, &settings).await
    } else {
        let entity_type: EntityType = entity.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        println!("Starting {} sync...", entity_type);
        sync_entity(&repo, entity_type, &settings)
            .await
            .map(|result| vec![result])
    };

    match outcome {
        Ok(results) => {
            let elapsed = start.elapsed();
            println!("Sync completed in {:.1}s", elapsed.as_secs_f64());
            for result in &results {
                print_result(result);
            }
            Ok(())
        }
        Err(e) => {
            error!("Sync failed: {e}");
            println!("Sync FAILED: {e}");
            Err(e.into())
        }
    }
}

/// Store the configured endpoint and client credentials, if all of them are set.
pub(crate) async fn seed_credential(repo: &SqliteRepository, config: &SlateConfig) -> anyhow::Result<()> {
    let ps = &config.powerschool;
    match (&ps.endpoint, &ps.client_id, &ps.client_secret) {
        (Some(endpoint), Some(client_id), Some(secret)) => {
            repo.configure_credential(endpoint, client_id, secret)
                .await?;
            info!(endpoint = %endpoint, "PowerSchool credentials stored");
        }
        (None, None, None) => {
            info!("No PowerSchool credentials in config, using stored credentials");
        }
        _ => {
            warn!("PowerSchool credentials partially configured, using stored credentials");
        }
    }
    Ok(())
}

fn print_result(result: &SyncResult) {
    println!(
        "  {:<10} job {:<5} {:>6} records  {} ms",
        result.entity.as_str(), result.job_id, result.count, result.duration_ms
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use slate_core::db::repository::{SchoolRepository, SyncJobRepository};
    use slate_core::models::sync::SyncStatus;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn write_config(dir: &std::path::Path, endpoint: &str) -> String {
        let _ = std::fs::remove_dir_all(dir);
        std::fs::create_dir_all(dir).unwrap();
        let db_path = dir.join("slate.db");
        let content = format!(
            r#"
[slate]
instance_name = "Test"
data_dir = "{dir}"

[slate.database]
path = "{db}"

[powerschool]
endpoint = "{endpoint}"
client_id = "id"
client_secret = "secret"
"#,
            dir = dir.display(),
            db = db_path.display(),
        );
        let config_path = dir.join("slate.toml");
        std::fs::write(&config_path, content).unwrap();
        config_path.to_string_lossy().to_string()
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok",
                "expires_in": 3600
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn sync_schools_seeds_credentials_and_persists() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/ws/schema/query/com.slate.reportcards.schools"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "schools",
                "record": [{
                    "id": 1,
                    "name": "schools",
                    "tables": {"schools": {"id": "1", "name": "Lincoln", "school_number": "100"}}
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = std::env::temp_dir().join("slate_test_sync_cmd");
        let config_path = write_config(&dir, &server.uri());

        run(&config_path, "schools").await.unwrap();

        let config = load_config(&config_path).unwrap();
        let repo = open_repository(&config).await.unwrap();
        let credential = repo.get_credential().await.unwrap();
        assert_eq!(credential.client_id, "id");
        assert_eq!(credential.access_token.as_deref(), Some("tok"));
        assert_eq!(repo.list_schools().await.unwrap().len(), 1);
        let job = repo
            .get_latest_sync_job(EntityType::Schools)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(job.status, SyncStatus::Completed);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn sync_rejects_unknown_entity() {
        let server = MockServer::start().await;
        let dir = std::env::temp_dir().join("slate_test_sync_cmd_unknown");
        let config_path = write_config(&dir, &server.uri());

        let err = run(&config_path, "students").await.unwrap_err();
        assert!(err.to_string().contains("unknown entity type"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn sync_upstream_failure_is_an_error() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/ws/schema/query/com.slate.reportcards.courses"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let dir = std::env::temp_dir().join("slate_test_sync_cmd_failure");
        let config_path = write_config(&dir, &server.uri());

        assert!(run(&config_path, "courses").await.is_err());

        let config = load_config(&config_path).unwrap();
        let repo = open_repository(&config).await.unwrap();
        let job = repo
            .get_latest_sync_job(EntityType::Courses)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(job.status, SyncStatus::Failed);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
