//! Error types for the Slate core crate.

use thiserror::Error;

/// Top-level error type for all Slate core operations.
#[derive(Debug, Error)]
pub enum SlateError {
    #[error("configuration error: {0}")]
    Config(String),

    /// Upstream credentials are missing a required field; no job was started.
    #[error("upstream configuration incomplete: {0}")]
    ConfigIncomplete(String),

    #[error("authentication configuration error: {0}")]
    AuthConfig(String),

    #[error("token acquisition failed with status {status}: {body}")]
    AuthAcquisition { status: u16, body: String },

    #[error("upstream API request failed with status {status}: {body}")]
    UpstreamApi { status: u16, body: String },

    #[error("malformed {entity} record: field '{field}' has invalid value '{value}'")]
    MalformedRecord {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ledger error: {0}")]
    Ledger(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl SlateError {
    /// HTTP status the console reports for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            SlateError::Config(_) | SlateError::ConfigIncomplete(_) => 400,
            SlateError::AuthConfig(_) => 401,
            SlateError::NotFound(_) => 404,
            _ => 500,
        }
    }
}

impl From<serde_json::Error> for SlateError {
    fn from(err: serde_json::Error) -> Self {
        SlateError::Serialization(err.to_string())
    }
}

/// A convenience Result alias that defaults to [`SlateError`].
pub type Result<T> = std::result::Result<T, SlateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_incomplete_display() {
        let err = SlateError::ConfigIncomplete("client_secret is empty".into());
        assert_eq!(
            err.to_string(),
            "upstream configuration incomplete: client_secret is empty"
        );
    }

    #[test]
    fn upstream_api_display_carries_status_and_body() {
        let err = SlateError::UpstreamApi {
            status: 503,
            body: "maintenance".into(),
        };
        assert_eq!(
            err.to_string(),
            "upstream API request failed with status 503: maintenance"
        );
    }

    #[test]
    fn malformed_record_display() {
        let err = SlateError::MalformedRecord {
            entity: "teacher",
            field: "dcid",
            value: "abc".into(),
        };
        assert_eq!(
            err.to_string(),
            "malformed teacher record: field 'dcid' has invalid value 'abc'"
        );
    }

    #[test]
    fn io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = SlateError::from(io_err);
        assert!(matches!(err, SlateError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn http_status_mapping() {
        assert_eq!(SlateError::ConfigIncomplete("x".into()).http_status(), 400);
        assert_eq!(SlateError::AuthConfig("x".into()).http_status(), 401);
        assert_eq!(
            SlateError::AuthAcquisition {
                status: 400,
                body: String::new()
            }
            .http_status(),
            500
        );
        assert_eq!(
            SlateError::UpstreamApi {
                status: 401,
                body: String::new()
            }
            .http_status(),
            500
        );
        assert_eq!(SlateError::NotFound("term".into()).http_status(), 404);
    }

    #[test]
    fn result_alias_works() {
        let ok: Result<i32> = Ok(42);
        assert!(ok.is_ok());

        let err: Result<i32> = Err(SlateError::Config("bad".into()));
        assert!(err.is_err());
    }
}
