//! Error types for registry and template operations

use thiserror::Error;

/// Errors that can occur while talking to a search cluster
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cluster returned status {status}: {reason}")]
    Cluster { status: u16, reason: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Connection handle closed: {0}")]
    HandleClosed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Get the error type as a string for log fields
    pub fn error_type(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::ClusterNotFound(_) => "cluster_not_found",
            Error::Http(e) if e.is_timeout() => "timeout",
            Error::Http(e) if e.is_connect() => "connect",
            Error::Http(_) => "transport",
            Error::Cluster { .. } => "cluster",
            Error::InvalidRequest(_) => "invalid_request",
            Error::HandleClosed(_) => "handle_closed",
            Error::Json(_) => "json",
            Error::Toml(_) => "toml",
            Error::Io(_) => "io",
            Error::InvalidUrl(_) => "invalid_url",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
