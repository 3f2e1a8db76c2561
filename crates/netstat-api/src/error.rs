//! HTTP error mapping for the statistics API

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use netstat_core::{Error, types::ErrorResponse};
use std::fmt;
use tracing::error;

/// Error returned by every API handler
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code
    pub status: StatusCode,
    /// Human readable message
    pub message: String,
    /// Machine readable error code
    pub code: &'static str,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
        }
    }

    /// 400 with the given message
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }

    /// 400 for a missing or unparsable body
    #[must_use]
    pub fn missing_body() -> Self {
        Self::bad_request("You must provide query parameters.")
    }

    /// 500, the underlying cause is logged and hidden from the client
    pub fn internal(cause: impl fmt::Display) -> Self {
        error!("Internal error: {cause}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error.",
            "INTERNAL_ERROR",
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidDate { .. } => Self::new(
                StatusCode::BAD_REQUEST,
                "Wrong date format.",
                "WRONG_DATE_FORMAT",
            ),
            Error::InvalidDateRange { reason } => {
                Self::new(StatusCode::BAD_REQUEST, format!("Invalid date range: {reason}."), "INVALID_DATE_RANGE")
            }
            err @ Error::DateRangeTooLong { .. } => {
                Self::new(StatusCode::BAD_REQUEST, err.to_string(), "DATE_RANGE_TOO_LONG")
            }
            Error::InvalidStatistics { .. } => Self::new(
                StatusCode::BAD_REQUEST,
                "Invalid statistics.",
                "INVALID_STATISTICS",
            ),
            Error::Validation { field, message } => Self::new(
                StatusCode::BAD_REQUEST,
                format!("Invalid field {field}: {message}"),
                "VALIDATION_ERROR",
            ),
            Error::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "Device not found.", "NOT_FOUND")
            }
            Error::Conflict { .. } => Self::new(
                StatusCode::CONFLICT,
                "The provided device id already exists in database.",
                "CONFLICT",
            ),
            other => Self::internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse::new(self.message, self.code)),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_core_errors_map_to_status_codes() {
        let cases = [
            (
                Error::InvalidDate {
                    input: "x".to_string(),
                },
                StatusCode::BAD_REQUEST,
                "Wrong date format.",
            ),
            (
                Error::DateRangeTooLong { max_days: 31 },
                StatusCode::BAD_REQUEST,
                "Too long date range (maximum is 31 days).",
            ),
            (
                Error::InvalidStatistics {
                    reason: "too much".to_string(),
                },
                StatusCode::BAD_REQUEST,
                "Invalid statistics.",
            ),
            (
                Error::NotFound {
                    resource: "device".to_string(),
                },
                StatusCode::NOT_FOUND,
                "Device not found.",
            ),
            (
                Error::Conflict {
                    resource: "device".to_string(),
                },
                StatusCode::CONFLICT,
                "The provided device id already exists in database.",
            ),
        ];

        for (err, status, message) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status, status);
            assert_eq!(api.message, message);
        }
    }

    #[test]
    fn test_database_errors_are_hidden() {
        let api = ApiError::from(Error::Database("password authentication failed".to_string()));
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.message.contains("password"));
    }
}
