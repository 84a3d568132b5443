//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every failure of the inventory core maps onto one of these kinds. Messages
/// are surfaced to callers as-is, so keep them human-readable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// One or more fields failed validation. Messages are kept in field order.
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    /// Another record already uses this inventory code.
    #[error("an item with inventory code {0} already exists")]
    DuplicateCode(String),

    /// A referenced record could not be resolved.
    #[error("{0} not found")]
    NotFound(String),

    /// The backing row store failed (I/O, decoding, poisoned lock).
    #[error("storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(vec![msg.into()])
    }

    /// Build a validation error from a list of messages.
    ///
    /// Returns `Ok(())` when the list is empty so callers can collect first and
    /// decide afterwards.
    pub fn check(messages: Vec<String>) -> DomainResult<()> {
        if messages.is_empty() {
            Ok(())
        } else {
            Err(Self::Validation(messages))
        }
    }

    pub fn duplicate_code(code: impl Into<String>) -> Self {
        Self::DuplicateCode(code.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Stable machine-readable kind, used in logs and HTTP mapping.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::DuplicateCode(_) => "duplicate_code",
            DomainError::NotFound(_) => "not_found",
            DomainError::Storage(_) => "storage_error",
        }
    }
}
