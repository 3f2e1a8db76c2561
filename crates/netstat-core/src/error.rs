//! Error types for FreeMobile Netstat

use std::{error::Error as StdError, fmt};

/// Main error type shared by the netstat crates
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(std::io::Error),

    /// Configuration error
    Configuration {
        /// Error message
        message: String,
    },

    /// Validation error
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// A date that is not in the expected `YYYYMMDD` or `DD/MM/YYYY` form
    InvalidDate {
        /// The rejected input
        input: String,
    },

    /// A date range that is reversed or ends in the future
    InvalidDateRange {
        /// Why the range was rejected
        reason: String,
    },

    /// A date range longer than the allowed window
    DateRangeTooLong {
        /// Maximum allowed span in days
        max_days: i64,
    },

    /// Uploaded statistics failed a consistency check
    InvalidStatistics {
        /// Which check failed
        reason: String,
    },

    /// Database error
    Database(String),

    /// Not found error
    NotFound {
        /// Resource that was not found
        resource: String,
    },

    /// Unique resource already exists
    Conflict {
        /// Resource that already exists
        resource: String,
    },

    /// Chart drawing error
    Chart(String),

    /// Serialization error
    Serialization(serde_json::Error),

    /// Other error
    Other(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Configuration { message } => write!(f, "Configuration error: {message}"),
            Self::Validation { field, message } => {
                write!(f, "Validation error: {field} - {message}")
            }
            Self::InvalidDate { input } => write!(f, "Wrong date format: {input}"),
            Self::InvalidDateRange { reason } => write!(f, "Invalid date range: {reason}"),
            Self::DateRangeTooLong { max_days } => {
                write!(f, "Too long date range (maximum is {max_days} days).")
            }
            Self::InvalidStatistics { reason } => write!(f, "Invalid statistics: {reason}"),
            Self::Database(msg) => write!(f, "Database error: {msg}"),
            Self::NotFound { resource } => write!(f, "Resource not found: {resource}"),
            Self::Conflict { resource } => write!(f, "Resource already exists: {resource}"),
            Self::Chart(msg) => write!(f, "Chart error: {msg}"),
            Self::Serialization(err) => write!(f, "Serialization error: {err}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map_or_else(|| "body".to_string(), ToString::to_string);
        Self::Validation {
            field,
            message: errors.to_string(),
        }
    }
}
