//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent malformed input that never reaches a store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("empty identifier")]
    EmptyIdentifier,

    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("invalid date '{value}', expected YYYY-MM-DD HH:MM:SS")]
    InvalidDate { value: String },
}
