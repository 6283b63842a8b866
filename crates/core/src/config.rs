//! TOML-based configuration system for Slate.

use crate::error::{Result, SlateError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level Slate configuration, deserialized from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlateConfig {
    pub slate: SlateSection,
    #[serde(default)]
    pub powerschool: PowerSchoolConfig,
    #[serde(default)]
    pub sync: SyncSettings,
}

/// Core Slate instance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlateSection {
    pub instance_name: String,
    pub data_dir: String,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Database backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: Some("/var/lib/slate/slate.db".into()),
        }
    }
}

/// PowerSchool connection settings.
///
/// The endpoint and client credentials seed the credential store; once
/// stored, the engine reads them from there so a token refresh can be
/// persisted alongside them.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PowerSchoolConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub queries: QueryNames,
}

/// Named PowerQuery endpoints, one per synced entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryNames {
    #[serde(default = "default_schools_query")]
    pub schools: String,
    #[serde(default = "default_terms_query")]
    pub terms: String,
    #[serde(default = "default_teachers_query")]
    pub teachers: String,
    #[serde(default = "default_courses_query")]
    pub courses: String,
    #[serde(default = "default_contacts_query")]
    pub contacts: String,
}

impl Default for QueryNames {
    fn default() -> Self {
        Self {
            schools: default_schools_query(),
            terms: default_terms_query(),
            teachers: default_teachers_query(),
            courses: default_courses_query(),
            contacts: default_contacts_query(),
        }
    }
}

fn default_schools_query() -> String {
    "com.slate.reportcards.schools".into()
}

fn default_terms_query() -> String {
    "com.slate.reportcards.terms".into()
}

fn default_teachers_query() -> String {
    "com.slate.reportcards.teachers".into()
}

fn default_courses_query() -> String {
    "com.slate.reportcards.courses".into()
}

fn default_contacts_query() -> String {
    "com.slate.reportcards.contact_emails".into()
}

/// Tunables for a synchronization run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncSettings {
    /// Rows requested per page for paginated queries.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Records returned to the caller as a preview.
    #[serde(default = "default_preview_limit")]
    pub preview_limit: usize,
    /// Records kept in the ledger's result summary.
    #[serde(default = "default_summary_limit")]
    pub summary_limit: usize,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// A cached token this close to expiry is treated as expired.
    #[serde(default = "default_token_skew")]
    pub token_expiry_skew_secs: i64,
    /// Filled from `[powerschool.queries]` by [`SlateConfig::sync_settings`].
    #[serde(skip)]
    pub queries: QueryNames,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            preview_limit: default_preview_limit(),
            summary_limit: default_summary_limit(),
            request_timeout_secs: default_request_timeout(),
            token_expiry_skew_secs: default_token_skew(),
            queries: QueryNames::default(),
        }
    }
}

fn default_page_size() -> u32 {
    100
}

fn default_preview_limit() -> usize {
    5
}

fn default_summary_limit() -> usize {
    10
}

fn default_request_timeout() -> u64 {
    30
}

fn default_token_skew() -> i64 {
    60
}

impl SlateConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| SlateError::Config(format!("failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Validate the configuration for required fields and consistency.
    pub fn validate(&self) -> Result<()> {
        if self.slate.instance_name.trim().is_empty() {
            return Err(SlateError::Config("instance_name is required".into()));
        }
        if self.slate.data_dir.trim().is_empty() {
            return Err(SlateError::Config("data_dir is required".into()));
        }
        if self.slate.database.path.is_none() {
            return Err(SlateError::Config(
                "database.path is required for sqlite".into(),
            ));
        }
        if self.sync.page_size == 0 {
            return Err(SlateError::Config(
                "sync.page_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Settings handed to the orchestrator, with the configured query names.
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            queries: self.powerschool.queries.clone(),
            ..self.sync.clone()
        }
    }

    /// Generate a default configuration suitable for a fresh install.
    pub fn generate_default() -> Self {
        Self {
            slate: SlateSection {
                instance_name: "Slate".into(),
                data_dir: "/var/lib/slate".into(),
                database: DatabaseConfig::default(),
            },
            powerschool: PowerSchoolConfig::default(),
            sync: SyncSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TOML: &str = r#"
[slate]
instance_name = "Springfield Elementary"
data_dir = "/var/lib/slate"

[slate.database]
path = "/var/lib/slate/slate.db"

[powerschool]
endpoint = "https://ps.springfield.k12.us"
client_id = "abc"
client_secret = "shh"

[powerschool.queries]
teachers = "org.springfield.teachers"

[sync]
page_size = 50
preview_limit = 3
"#;

    fn parse_sample() -> SlateConfig {
        toml::from_str(SAMPLE_TOML).expect("sample TOML should parse")
    }

    #[test]
    fn parse_full_config() {
        let cfg = parse_sample();
        assert_eq!(cfg.slate.instance_name, "Springfield Elementary");
        assert_eq!(
            cfg.powerschool.endpoint.as_deref(),
            Some("https://ps.springfield.k12.us")
        );
        assert_eq!(cfg.powerschool.queries.teachers, "org.springfield.teachers");
        assert_eq!(cfg.powerschool.queries.schools, "com.slate.reportcards.schools");
        assert_eq!(cfg.sync.page_size, 50);
        assert_eq!(cfg.sync.preview_limit, 3);
        assert_eq!(cfg.sync.summary_limit, 10);
    }

    #[test]
    fn sync_settings_carry_configured_queries() {
        let cfg = parse_sample();
        let settings = cfg.sync_settings();
        assert_eq!(settings.page_size, 50);
        assert_eq!(settings.queries.teachers, "org.springfield.teachers");
    }

    #[test]
    fn roundtrip_serialization() {
        let cfg = parse_sample();
        let serialized = toml::to_string(&cfg).expect("should serialize");
        let back: SlateConfig = toml::from_str(&serialized).expect("should deserialize roundtrip");
        assert_eq!(back.slate.instance_name, cfg.slate.instance_name);
        assert_eq!(back.sync, cfg.sync);
    }

    #[test]
    fn generate_default_is_valid() {
        let cfg = SlateConfig::generate_default();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn minimal_config_parses() {
        let minimal = r#"
[slate]
instance_name = "Test"
data_dir = "/tmp/slate"
"#;
        let cfg: SlateConfig = toml::from_str(minimal).expect("minimal config should parse");
        assert!(cfg.powerschool.endpoint.is_none());
        assert_eq!(cfg.sync.page_size, 100);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_requires_instance_name() {
        let mut cfg = SlateConfig::generate_default();
        cfg.slate.instance_name = " ".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("instance_name"));
    }

    #[test]
    fn validate_requires_sqlite_path() {
        let mut cfg = SlateConfig::generate_default();
        cfg.slate.database.path = None;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_page_size() {
        let mut cfg = SlateConfig::generate_default();
        cfg.sync.page_size = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn load_from_file() {
        let dir = std::env::temp_dir().join("slate_test_load_config");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("slate.toml");
        std::fs::write(&path, SAMPLE_TOML).unwrap();

        let cfg = SlateConfig::load(&path).unwrap();
        assert_eq!(cfg.slate.instance_name, "Springfield Elementary");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_nonexistent_file_returns_io_error() {
        let result = SlateConfig::load(Path::new("/nonexistent/slate.toml"));
        assert!(matches!(result, Err(SlateError::Io(_))));
    }

    #[test]
    fn load_invalid_toml_returns_config_error() {
        let dir = std::env::temp_dir().join("slate_test_bad_toml");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        std::fs::write(&path, "this is [[[not valid toml").unwrap();

        let result = SlateConfig::load(&path);
        assert!(matches!(result, Err(SlateError::Config(_))));

        std::fs::remove_dir_all(&dir).ok();
    }
}
