//! Error types for the repository engine
//!
//! This module defines the error taxonomy shared by every layer.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Two families exist:
//! - [`DriverError`]: failures raised by the database client collaborator.
//!   The engine never re-classifies these; they travel inside
//!   [`Error::Driver`] exactly as the driver produced them.
//! - [`Error`]: everything else, including the fail-fast argument and
//!   key-type checks that run before any I/O.
//!
//! Absence of a document is never an error. Point lookups return `None`,
//! existence checks return `false` and counts return `0`.

use thiserror::Error;

/// Result type alias for repository operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for driver operations
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Errors surfaced by the database client collaborator
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DriverError {
    /// A unique constraint (the `_id` or a unique index) was violated
    #[error("Duplicate key in collection '{collection}' on index '{index}': {key}")]
    DuplicateKey {
        /// Collection the write targeted
        collection: String,
        /// Name of the violated index
        index: String,
        /// Rendered key value
        key: String,
    },

    /// The document was rejected by the store
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A filter, sort or projection could not be evaluated
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// An update definition could not be applied
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    /// No index with the given name exists
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// An index with the same name but a different definition exists
    #[error("Index conflict: {0}")]
    IndexConflict(String),

    /// The call was cancelled by the caller's token
    #[error("Operation cancelled")]
    Cancelled,

    /// Any other failure inside the driver
    #[error("Driver error: {0}")]
    Internal(String),
}

/// Error types for the repository engine
#[derive(Debug, Error)]
pub enum Error {
    /// Caller input rejected before any I/O
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A partitioned document type was routed without a partition key
    #[error("Missing partition key for partitioned document type '{document_type}'")]
    MissingPartitionKey {
        /// Name of the document type
        document_type: String,
    },

    /// The key type has no auto-generation strategy
    #[error("Unsupported key type '{key_type}': the key must be supplied by the caller")]
    UnsupportedKeyType {
        /// Name of the key type
        key_type: String,
    },

    /// Document could not be converted to or from its stored form
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure reported by the database client, carried unchanged
    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl Error {
    /// Build an [`Error::InvalidArgument`]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Build an [`Error::Config`]
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// True when the driver reported a unique-constraint violation
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Error::Driver(DriverError::DuplicateKey { .. }))
    }

    /// True when the call was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Driver(DriverError::Cancelled))
    }

    /// Access the driver error, if this error came from the driver
    pub fn as_driver(&self) -> Option<&DriverError> {
        match self {
            Error::Driver(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
