//! Error types for fetching result pages.

use std::time::Duration;
use thiserror::Error;

/// Failure of a single remote fetch.
///
/// All variants surface identically to the UI (through `Display`); the kind
/// only matters for logging.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error: {reason}")]
    Network { reason: String },

    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {reason}")]
    Malformed { reason: String },

    #[error("Request timed out after {}ms", .elapsed.as_millis())]
    Timeout { elapsed: Duration },
}

/// Coarse classification of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// Transport failure or non-2xx status.
    Network,
    /// Body did not match the expected shape.
    MalformedResponse,
    Timeout,
}

impl FetchError {
    pub fn network(reason: impl Into<String>) -> Self {
        Self::Network {
            reason: reason.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Network { .. } | FetchError::Status { .. } => FetchErrorKind::Network,
            FetchError::Malformed { .. } => FetchErrorKind::MalformedResponse,
            FetchError::Timeout { .. } => FetchErrorKind::Timeout,
        }
    }
}

/// Error when parsing a filter from user input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterParseError {
    #[error("Invalid status filter: {0} (expected all, new or scraped)")]
    UnknownStatus(String),

    #[error("Category filter must not be empty")]
    EmptyCategory,
}
