//! API error taxonomy
//!
//! Every failure a request can hit maps to one variant here, and every
//! variant maps to exactly one status code and error body.

use hyper::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

/// Result type for request handling
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced to API clients
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Request payload failed validation (missing/invalid fields)
    #[error("{0}")]
    Validation(String),

    /// Path named a resource outside the configured set
    #[error("unknown resource '{name}'. allowed: {allowed}")]
    UnknownResource { name: String, allowed: String },

    /// Item id does not exist
    #[error("not_found")]
    NotFound,

    /// Update resolved to no effective change (missing id or empty field set)
    #[error("not_found_or_no_change")]
    NothingToUpdate,

    /// Backing table operation failed
    #[error("{0}")]
    Storage(String),

    /// Anything else uncaught
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Status code for the uniform envelope
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::UnknownResource { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::NothingToUpdate => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error body for the uniform envelope
    ///
    /// 4xx bodies carry the message under `error`; 5xx bodies carry a fixed
    /// tag under `error` and the backing message under `message`, so callers
    /// can branch on the tag without parsing free text.
    pub fn body(&self) -> Value {
        match self {
            Self::Storage(message) => json!({"error": "storage_error", "message": message}),
            Self::Internal(message) => {
                json!({"error": "internal_server_error", "message": message})
            }
            other => json!({"error": other.to_string()}),
        }
    }
}
