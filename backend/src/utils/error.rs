use serde::Serialize;
use thiserror::Error;

use crate::models::ServerId;

/// Stats error with enough context to tell producer corruption apart from
/// user mistakes
///
/// Request errors (unrecognized descriptor, missing entity) are reported back to
/// the caller. Format and precondition errors mean the collection layer or a
/// caller broke its contract and surface as internal errors.
#[derive(Error, Debug)]
pub enum StatsError {
    // Request errors 4xxx
    #[error("Unrecognized stats request: {0}")]
    UnrecognizedRequest(String),

    // Resource errors 3xxx
    #[error("{0} does not exist")]
    NotFound(String),

    // Internal errors 5xxx
    #[error("Malformed stats document at `{path}`: {message}")]
    Format { path: String, message: String },

    #[error("Server {0} missing from parsed stats")]
    MissingServer(ServerId),

    #[error("Invalid stats filter: {0}")]
    Filter(#[from] regex::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic wrapper for other errors - auto-convert from anyhow::Error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StatsError {
    /// Helper to create a format error for a document path
    pub fn format(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format { path: path.into(), message: message.into() }
    }

    /// Helper to create an unrecognized request error
    pub fn unrecognized(descriptor: impl std::fmt::Display) -> Self {
        Self::UnrecognizedRequest(descriptor.to_string())
    }

    /// Helper to create not found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Stable numeric code for the error class
    pub fn error_code(&self) -> i32 {
        match self {
            Self::UnrecognizedRequest(_) => 4001,
            Self::NotFound(_) => 3000,
            Self::Format { .. } => 5001,
            Self::MissingServer(_) => 5002,
            Self::Json(_) => 5003,
            Self::Filter(_) => 5004,
            Self::Other(_) => 5000,
        }
    }

    /// Whether the error was caused by the request rather than by corrupt input
    pub fn is_user_error(&self) -> bool {
        matches!(self.error_code(), 3000..=4999)
    }
}

/// Error payload printed by the command line front end
#[derive(Debug, Serialize)]
pub struct StatsErrorResponse {
    pub code: i32,
    pub message: String,
}

impl From<&StatsError> for StatsErrorResponse {
    fn from(err: &StatsError) -> Self {
        Self { code: err.error_code(), message: err.to_string() }
    }
}

pub type StatsResult<T> = Result<T, StatsError>;
