//! Error types for flock-feed

use std::path::PathBuf;

use thiserror::Error;

/// A single rejected field of a flock input
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FlockError {
    #[error("invalid flock parameters: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("profile '{0}' not found")]
    ProfileNotFound(String),

    #[error("profile name must not be empty")]
    EmptyProfileName,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{service} request to {url} failed: {source}")]
    Http {
        service: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned status {status} after {attempts} attempt(s): {body}")]
    Status {
        service: &'static str,
        status: u16,
        attempts: usize,
        body: String,
    },

    #[error("{service} is not configured (set remote.{key} in the config file)")]
    RemoteNotConfigured {
        service: &'static str,
        key: &'static str,
    },

    #[error("invalid {service} base URL '{url}'")]
    InvalidUrl { service: &'static str, url: String },

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, FlockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_field() {
        let err = FlockError::Validation(vec![
            ValidationError::new("age", "must not be negative"),
            ValidationError::new("quantity", "must be at least 1"),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid flock parameters: age: must not be negative; quantity: must be at least 1"
        );
    }
}
