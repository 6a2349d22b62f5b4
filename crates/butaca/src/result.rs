//! Result and error types for Butaca.

use thiserror::Error;

/// Result type for Butaca operations
pub type SeatResult<T> = Result<T, SeatError>;

/// Errors that can occur while reading or selecting seats.
///
/// Every variant is fatal to the strategy call that raised it. Nothing is
/// retried internally: a seat map in an inconsistent state must fail the
/// scenario rather than be patched over.
#[derive(Debug, Error)]
pub enum SeatError {
    /// No seat matched a required pattern
    #[error("No matching seats: {message}")]
    NotFound {
        /// Error message
        message: String,
    },

    /// A bounded wait elapsed
    #[error("Timed out after {ms}ms waiting for {waited_for}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// What was being waited for
        waited_for: String,
    },

    /// Caller asked for something the seat map cannot satisfy
    #[error("Invalid seat request: {message}")]
    InvalidRequest {
        /// Error message
        message: String,
    },

    /// Seat label had no row/number (strict parsing only)
    #[error("Unparsable seat label: {label:?}")]
    Parse {
        /// Raw label text
        label: String,
    },

    /// Browser port failure
    #[error("Browser error: {message}")]
    Browser {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl SeatError {
    /// Create a not-found error
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an invalid-request error
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(ms: u64, waited_for: impl Into<String>) -> Self {
        Self::Timeout {
            ms,
            waited_for: waited_for.into(),
        }
    }

    /// Create a browser error
    #[must_use]
    pub fn browser(message: impl Into<String>) -> Self {
        Self::Browser {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error belongs to the not-found class
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this error belongs to the invalid-request class
    #[must_use]
    pub const fn is_invalid_request(&self) -> bool {
        matches!(self, Self::InvalidRequest { .. })
    }

    /// Whether this error is a bounded-wait timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
