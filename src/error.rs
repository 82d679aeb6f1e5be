//! Application error types and HTTP response mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Machine-readable error payload returned by every failing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

/// Application-level error taxonomy.
///
/// Every fallible operation in the engine surfaces one of these variants.
/// `Forbidden` carries a short `reason` that is stable across releases
/// (`"blocked"`, `"inactive"`, `"expired"`, `"not yet active"`,
/// `"limit reached"`, `"already used"`, `"invalid password"`) so callers can
/// branch on it without parsing prose.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input failed validation (malformed URL, bad alias, invalid dates).
    #[error("{message}")]
    Validation { message: String, details: Value },

    /// The referenced link or short code does not exist.
    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// The link exists but must not be resolved or mutated in this state.
    #[error("forbidden: {reason}")]
    Forbidden { reason: String, details: Value },

    /// Unique constraint violation (code or alias already taken).
    #[error("{message}")]
    Conflict { message: String, details: Value },

    /// A rolling-window quota rejected the request.
    #[error("{message}")]
    TooManyRequests { message: String, details: Value },

    /// A bounded retry budget was spent without success; safe to retry later.
    #[error("{message}")]
    Exhausted { message: String, details: Value },

    /// Unexpected infrastructure failure.
    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn forbidden(reason: impl Into<String>, details: Value) -> Self {
        Self::Forbidden {
            reason: reason.into(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn too_many_requests(message: impl Into<String>, details: Value) -> Self {
        Self::TooManyRequests {
            message: message.into(),
            details,
        }
    }

    pub fn exhausted(message: impl Into<String>, details: Value) -> Self {
        Self::Exhausted {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Returns the `Forbidden` reason, if this is a `Forbidden` error.
    pub fn forbidden_reason(&self) -> Option<&str> {
        match self {
            Self::Forbidden { reason, .. } => Some(reason.as_str()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            AppError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message,
                details,
            ),
            AppError::NotFound { message, details } => {
                (StatusCode::NOT_FOUND, "not_found", message, details)
            }
            AppError::Forbidden { reason, details } => {
                (StatusCode::FORBIDDEN, "forbidden", reason, details)
            }
            AppError::Conflict { message, details } => {
                (StatusCode::CONFLICT, "conflict", message, details)
            }
            AppError::TooManyRequests { message, details } => (
                StatusCode::TOO_MANY_REQUESTS,
                "too_many_requests",
                message,
                details,
            ),
            AppError::Exhausted { message, details } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "exhausted",
                message,
                details,
            ),
            AppError::Internal { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                message,
                details,
            ),
        };

        let body = ErrorBody {
            error: ErrorInfo {
                code,
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error() {
            if db.is_unique_violation() {
                return AppError::conflict(
                    "Unique constraint violation",
                    json!({ "constraint": db.constraint() }),
                );
            }
        }

        if matches!(e, sqlx::Error::RowNotFound) {
            return AppError::not_found("Row not found", json!({}));
        }

        tracing::error!("database error: {e}");
        AppError::internal("Database error", json!({}))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(&e).unwrap_or_else(|_| json!({}));
        AppError::bad_request("Request validation failed", details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_reason_accessor() {
        let err = AppError::forbidden("limit reached", json!({}));
        assert_eq!(err.forbidden_reason(), Some("limit reached"));

        let err = AppError::not_found("nope", json!({}));
        assert_eq!(err.forbidden_reason(), None);
    }

    #[test]
    fn test_display_uses_message() {
        let err = AppError::bad_request("Alias too short", json!({}));
        assert_eq!(err.to_string(), "Alias too short");

        let err = AppError::forbidden("expired", json!({}));
        assert_eq!(err.to_string(), "forbidden: expired");
    }
}
