//! Error types for the extraction pipeline.
//!
//! All errors in the system are represented by the [`Error`] enum.
//! This ensures composable error handling across crates.

use std::io;
use thiserror::Error as ThisError;

/// The core error type for all blockcards operations.
#[derive(ThisError, Debug)]
pub enum Error {
    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A graph query or lookup failed
    #[error("Query failed ({query}): {reason}")]
    QueryFailed { query: String, reason: String },

    /// The content renderer could not convert markup
    #[error("Render failed: {reason}")]
    RenderFailed { reason: String },

    /// Parse error
    #[error("Parse error: {reason}")]
    ParseError { reason: String },

    /// Invalid configuration
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    /// Not found in graph
    #[error("Not found in graph: {key}")]
    NotFound { key: String },

    /// Generic unclassified error
    #[error("Error: {0}")]
    Other(String),
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an IO error
    pub fn io(err: io::Error) -> Self {
        Error::Io(err)
    }

    /// Create a query failure
    pub fn query_failed(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::QueryFailed {
            query: query.into(),
            reason: reason.into(),
        }
    }

    /// Create a render failure
    pub fn render_failed(reason: impl Into<String>) -> Self {
        Error::RenderFailed {
            reason: reason.into(),
        }
    }

    /// Create a parse error
    pub fn parse_error(reason: impl Into<String>) -> Self {
        Error::ParseError {
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(reason: impl Into<String>) -> Self {
        Error::ConfigError {
            reason: reason.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(key: impl Into<String>) -> Self {
        Error::NotFound { key: key.into() }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::query_failed("page card", "connection reset");
        assert!(err.to_string().contains("Query failed (page card)"));

        let err = Error::render_failed("unsupported format");
        assert!(err.to_string().contains("Render failed"));

        let err = Error::not_found("block 42");
        assert_eq!(err.to_string(), "Not found in graph: block 42");
    }
}
