//! Error conversion helpers for store calls
//!
//! Provides an extension trait for attaching operator-facing context to I/O failures.

use std::io;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add context to a store error.
    ///
    /// # Example
    /// ```ignore
    /// self.store.delete_signup(signup.id)
    ///     .with_context("delete signup")?;
    /// ```
    fn with_context(self, action: &str) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_context(self, action: &str) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{}: {}", action, e),
            source: Some(Box::new(e)),
        })
    }
}
