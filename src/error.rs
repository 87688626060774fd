use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

/// Upstream bodies are cut to this many characters before reaching a caller.
pub const VENDOR_EXCERPT_CHARS: usize = 200;

#[derive(Debug, ThisError)]
pub enum OpenpackError {
    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("External auth failed: {detail}")]
    VendorStatus { status: StatusCode, detail: String },

    #[error("Network error contacting auth API: {0}")]
    VendorTransport(#[from] reqwest::Error),

    #[error("Failed to create session: {0}")]
    Session(String),

    #[error("Malformed vendor response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl OpenpackError {
    /// Build the error for a non-2xx vendor answer, keeping a bounded excerpt of its body.
    pub fn vendor_status(status: StatusCode, body: &str) -> Self {
        OpenpackError::VendorStatus {
            status,
            detail: body.chars().take(VENDOR_EXCERPT_CHARS).collect(),
        }
    }

    /// Any failure inside the session exchange that is neither an upstream status
    /// nor a transport error is reported as a session failure.
    pub fn into_session_failure(self) -> Self {
        match self {
            e @ (OpenpackError::VendorStatus { .. }
            | OpenpackError::VendorTransport(_)
            | OpenpackError::Session(_)) => e,
            other => OpenpackError::Session(other.to_string()),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            OpenpackError::Forbidden(_) => StatusCode::FORBIDDEN,
            OpenpackError::NotFound(_) => StatusCode::NOT_FOUND,
            OpenpackError::Conflict(_) => StatusCode::CONFLICT,
            OpenpackError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            OpenpackError::VendorStatus { status, .. } => *status,
            OpenpackError::VendorTransport(_)
            | OpenpackError::Session(_)
            | OpenpackError::Json(_)
            | OpenpackError::Database(_)
            | OpenpackError::PasswordHash(_)
            | OpenpackError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for OpenpackError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = match &self {
            OpenpackError::Forbidden(_) => ApiErrorBody::new("FORBIDDEN", self.to_string()),
            OpenpackError::NotFound(_) => ApiErrorBody::new("NOT_FOUND", self.to_string()),
            OpenpackError::Conflict(_) => ApiErrorBody::new("CONFLICT", self.to_string()),
            OpenpackError::InvalidInput(_) => {
                ApiErrorBody::new("INVALID_INPUT", self.to_string())
            }
            OpenpackError::VendorStatus { .. } => {
                ApiErrorBody::new("UPSTREAM_ERROR", self.to_string())
            }
            OpenpackError::VendorTransport(_) => {
                ApiErrorBody::new("UPSTREAM_UNREACHABLE", self.to_string())
            }
            OpenpackError::Session(_) | OpenpackError::Json(_) => {
                ApiErrorBody::new("SESSION_ERROR", self.to_string())
            }
            OpenpackError::Database(_)
            | OpenpackError::PasswordHash(_)
            | OpenpackError::Config(_) => {
                error!(error = %self, "internal error");
                ApiErrorBody::new(
                    "INTERNAL_ERROR",
                    "An internal server error occurred.".to_string(),
                )
            }
        };
        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiErrorBody {
    fn new(code: &str, message: String) -> Self {
        Self {
            code: code.to_string(),
            message,
        }
    }
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_excerpt_is_bounded_by_chars() {
        let body = "é".repeat(500);
        let OpenpackError::VendorStatus { status, detail } =
            OpenpackError::vendor_status(StatusCode::BAD_REQUEST, &body)
        else {
            panic!("expected vendor status error");
        };
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(detail.chars().count(), VENDOR_EXCERPT_CHARS);
    }

    #[test]
    fn database_failures_inside_exchange_become_session_failures() {
        let err = OpenpackError::Database(SqlxError::RowNotFound).into_session_failure();
        assert!(matches!(err, OpenpackError::Session(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let upstream = OpenpackError::vendor_status(StatusCode::UNAUTHORIZED, "nope");
        assert!(matches!(
            upstream.into_session_failure(),
            OpenpackError::VendorStatus { status: StatusCode::UNAUTHORIZED, .. }
        ));
    }
}
