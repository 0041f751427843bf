//! Domain error model.

use thiserror::Error as ThisError;

/// Result type used across the domain layer.
pub type Result<T> = core::result::Result<T, Error>;

/// Domain-level error taxonomy.
///
/// Keep this focused on deterministic business failures (validation,
/// missing references, conflicting transitions). Infrastructure failures
/// are wrapped into `Storage`/`PartialWrite` at the store boundary.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum Error {
    /// Missing or invalid fields: zero quantity, unknown item code,
    /// missing delivery date on approval. Nothing is written.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unknown order/store/item referenced by id or code.
    #[error("not found: {0}")]
    NotFound(String),

    /// A decision on a non-pending order, or a duplicate invoice
    /// sequence collision. Retryable only for invoice allocation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A batch append partially failed. Indicates a transaction boundary
    /// bug; never retried automatically.
    #[error("partial write: {0}")]
    PartialWrite(String),

    /// Storage-layer failure with the batch left uncommitted.
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn partial_write(msg: impl Into<String>) -> Self {
        Self::PartialWrite(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
