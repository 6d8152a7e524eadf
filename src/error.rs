//! Error types for the API client.

use std::collections::BTreeMap;

/// Errors returned by [`crate::ApiClient`] and the session stores.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No token, or the backend rejected it (401). The stored session is gone.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Authenticated but not allowed (403).
    #[error("forbidden: {message}")]
    Forbidden { message: String },

    /// Resource does not exist (404).
    #[error("not found: {path}")]
    NotFound { path: String },

    /// The backend refused the payload (400). Keys are field names.
    #[error("validation failed: {}", summarize(.fields))]
    Validation { fields: BTreeMap<String, Vec<String>> },

    /// Any other non-success status.
    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    /// Transport failure (DNS, connect, timeout, TLS).
    #[error("network error: {message}")]
    Network { message: String },

    /// Body could not be decoded.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Session file could not be written or removed.
    #[error("session storage error: {message}")]
    Session { message: String },

    /// Bad base URL or client setup.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl ApiError {
    /// Exit code for the one-shot commands.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unauthorized { .. } | Self::Forbidden { .. } => 2,
            Self::NotFound { .. } | Self::Validation { .. } => 3,
            Self::Network { .. } | Self::Server { .. } => 4,
            Self::InvalidResponse { .. } => 5,
            Self::Session { .. } | Self::Config { .. } => 6,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// First message reported for `field`, if the backend rejected it.
    pub fn field_error(&self, field: &str) -> Option<&str> {
        match self {
            Self::Validation { fields } => fields.get(field)?.first().map(String::as_str),
            _ => None,
        }
    }
}

fn summarize(fields: &BTreeMap<String, Vec<String>>) -> String {
    fields
        .iter()
        .map(|(field, msgs)| {
            if field == "non_field_errors" || field == "detail" {
                msgs.join("; ")
            } else {
                format!("{field}: {}", msgs.join("; "))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
