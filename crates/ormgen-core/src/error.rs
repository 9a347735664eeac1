//! Core error types.

use thiserror::Error;

/// Errors raised by a catalog source while answering a metadata query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// A catalog query failed.
    #[error("catalog query `{query}` failed: {message}")]
    Query {
        /// Name of the query that failed.
        query: String,
        /// Driver-provided failure message.
        message: String,
    },

    /// The connection to the catalog was lost.
    #[error("catalog connection lost: {0}")]
    Connection(String),
}

impl CatalogError {
    /// Create a query failure.
    pub fn query(query: impl Into<String>, message: impl Into<String>) -> Self {
        CatalogError::Query {
            query: query.into(),
            message: message.into(),
        }
    }
}

/// Result type returned by catalog sources.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Core errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Required catalog metadata could not be fetched.
    #[error("catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),

    /// I/O error while loading a snapshot or configuration.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot or configuration could not be decoded.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Catalog metadata violates a structural invariant.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Configuration value is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
