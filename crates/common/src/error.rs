//! Common error types and handling for Peerteam
//!
//! Every handler returns [`Result`]; the error side renders the JSON error
//! envelope `{status: "error", error, details?}` with the matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Peerteam application
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("An unexpected error occurred: {0}")]
    Unexpected(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Missing student or team
    #[error("{0}")]
    NotFound(String),

    /// Business rule rejection (duplicate name, full team, not a member)
    #[error("{0}")]
    Unprocessable(String),

    /// Input failed validation; `details` lists each failed rule
    #[error("{error}")]
    Validation { error: String, details: Vec<String> },

    /// System failure with the underlying message kept as details
    #[error("{error}: {details}")]
    Internal { error: String, details: String },
}

impl Error {
    /// Build an [`Error::Internal`] from a context message and an underlying cause
    pub fn internal(error: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Error::Internal {
            error: error.into(),
            details: cause.to_string(),
        }
    }

    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unprocessable(_) | Error::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Unexpected(_) | Error::Database(_) | Error::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the error code used in logs
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Unexpected(_) => "UNEXPECTED_ERROR",
            Error::Database(_) => "DATABASE_ERROR",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Unprocessable(_) => "UNPROCESSABLE",
            Error::Validation { .. } => "VALIDATION_ERROR",
            Error::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Shape this error into the JSON error envelope
    pub fn body(&self) -> ErrorBody {
        let (error, details) = match self {
            Error::Unexpected(_) | Error::NotFound(_) | Error::Unprocessable(_) => {
                (self.to_string(), None)
            }
            Error::Database(e) => (
                "Database error".to_string(),
                Some(Details::Message(e.to_string())),
            ),
            Error::Validation { error, details } => {
                (error.clone(), Some(Details::Messages(details.clone())))
            }
            Error::Internal { error, details } => {
                (error.clone(), Some(Details::Message(details.clone())))
            }
        };

        ErrorBody {
            status: "error",
            error,
            details,
        }
    }
}

/// JSON error envelope
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Details>,
}

/// Either a single underlying message or a list of validation messages
#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Details {
    Message(String),
    Messages(Vec<String>),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log internal errors with full context
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, code = self.error_code(), "Internal server error");
        } else {
            tracing::debug!(error = %self, code = self.error_code(), "Request rejected");
        }

        (status, Json(self.body())).into_response()
    }
}
