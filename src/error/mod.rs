// Error types for the firecache offline layer
// Author: kelexine (https://github.com/kelexine)

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OfflineError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Install failed: {0}")]
    Install(String),

    #[error("Sync registration failed: {0}")]
    SyncRegistration(String),

    #[error("No active generation")]
    NotActive,

    #[error("Notification not found: {0}")]
    NotificationNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OfflineError {
    /// True when the failure came from the network boundary rather than local state.
    pub fn is_network(&self) -> bool {
        matches!(self, OfflineError::Network(_) | OfflineError::Http(_))
    }
}

// Convert OfflineError to HTTP responses for Axum
impl IntoResponse for OfflineError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            OfflineError::Network(_) | OfflineError::Http(_) => {
                (StatusCode::BAD_GATEWAY, "network_error", self.to_string())
            }
            OfflineError::InvalidRequest(_) | OfflineError::Url(_) | OfflineError::Json(_) => {
                (StatusCode::BAD_REQUEST, "invalid_request_error", self.to_string())
            }
            OfflineError::NotificationNotFound(_) => {
                (StatusCode::NOT_FOUND, "not_found_error", self.to_string())
            }
            OfflineError::Install(_) | OfflineError::NotActive => {
                (StatusCode::SERVICE_UNAVAILABLE, "install_error", self.to_string())
            }
            OfflineError::Config(_) | OfflineError::ConfigParsing(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", self.to_string())
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", self.to_string()),
        };

        let body = json!({
            "type": "error",
            "error": {
                "type": error_type,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, OfflineError>;
