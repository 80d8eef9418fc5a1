//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),

    #[error("{failed} of {total} operations failed.")]
    Partial { failed: usize, total: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Partial { .. } => crate::exitcode::FAILURE,
            CliError::Io(_) => crate::exitcode::IOERR,
            CliError::Infra(e) => match e {
                InfraError::Store { .. } => crate::exitcode::IOERR,
                InfraError::Application(app) => match app {
                    ApplicationError::Domain(_) => crate::exitcode::DATAERR,
                    ApplicationError::UserNotFound(_) => crate::exitcode::NOUSER,
                    ApplicationError::AccessDenied { .. } => crate::exitcode::NOPERM,
                    ApplicationError::NotFound(_) => crate::exitcode::NOINPUT,
                    ApplicationError::InvalidInput(_) => crate::exitcode::USAGE,
                    ApplicationError::ComponentInactive(_) => crate::exitcode::UNAVAILABLE,
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::OperationFailed { .. } => crate::exitcode::SOFTWARE,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use rstest::rstest;

    #[rstest]
    #[case(ApplicationError::UserNotFound("bob".into()), 67)]
    #[case(ApplicationError::AccessDenied { thread_id: 1, user_id: 2 }, 77)]
    #[case(ApplicationError::NotFound("No message found.".into()), 66)]
    #[case(ApplicationError::failed("Notice was not sent."), 70)]
    #[case(ApplicationError::ComponentInactive("Messages".into()), 69)]
    #[case(ApplicationError::Domain(DomainError::EmptyIdentifier), 65)]
    fn given_application_error_when_mapping_then_sysexits_code(
        #[case] err: ApplicationError,
        #[case] code: i32,
    ) {
        assert_eq!(CliError::from(err).exit_code(), code);
    }

    #[test]
    fn given_partial_failure_when_mapping_then_generic_failure() {
        let err = CliError::Partial {
            failed: 1,
            total: 3,
        };
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "1 of 3 operations failed.");
    }
}
