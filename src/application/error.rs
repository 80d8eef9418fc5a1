//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::{DomainError, ThreadId};

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("No user found by that identifier: {0}.")]
    UserNotFound(String),

    #[error("User #{user_id} cannot access thread #{thread_id}.")]
    AccessDenied { thread_id: ThreadId, user_id: u64 },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("The {0} component is not active.")]
    ComponentInactive(String),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("{context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ApplicationError {
    /// Failure reported by the store without an underlying cause.
    pub fn failed(context: impl Into<String>) -> Self {
        Self::OperationFailed {
            context: context.into(),
            source: None,
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
