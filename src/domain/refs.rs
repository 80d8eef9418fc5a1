//! Operator-supplied identifiers
//!
//! Users may be named by numeric id or login; signups additionally by email.

use std::fmt;
use std::str::FromStr;

use crate::domain::{DomainError, SignupId, UserId};

/// Reference to a user account as typed on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    Id(UserId),
    Login(String),
}

impl FromStr for UserRef {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DomainError::EmptyIdentifier);
        }
        if s.bytes().all(|b| b.is_ascii_digit()) {
            return s
                .parse()
                .map(UserRef::Id)
                .map_err(|_| DomainError::InvalidId(s.to_string()));
        }
        Ok(UserRef::Login(s.to_string()))
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRef::Id(id) => write!(f, "{}", id),
            UserRef::Login(login) => write!(f, "{}", login),
        }
    }
}

/// Reference to a signup: id, email or login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupRef {
    Id(SignupId),
    Email(String),
    Login(String),
}

impl FromStr for SignupRef {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DomainError::EmptyIdentifier);
        }
        if s.bytes().all(|b| b.is_ascii_digit()) {
            return s
                .parse()
                .map(SignupRef::Id)
                .map_err(|_| DomainError::InvalidId(s.to_string()));
        }
        if s.contains('@') {
            return Ok(SignupRef::Email(s.to_string()));
        }
        Ok(SignupRef::Login(s.to_string()))
    }
}

impl fmt::Display for SignupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignupRef::Id(id) => write!(f, "{}", id),
            SignupRef::Email(v) | SignupRef::Login(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("10", UserRef::Id(10))]
    #[case(" 42 ", UserRef::Id(42))]
    #[case("admin", UserRef::Login("admin".into()))]
    #[case("user42", UserRef::Login("user42".into()))]
    fn given_identifier_when_parsing_user_ref_then_detects_kind(
        #[case] input: &str,
        #[case] expected: UserRef,
    ) {
        assert_eq!(input.parse::<UserRef>().unwrap(), expected);
    }

    #[test]
    fn given_empty_identifier_when_parsing_then_fails() {
        assert_eq!("  ".parse::<UserRef>(), Err(DomainError::EmptyIdentifier));
        assert_eq!("".parse::<SignupRef>(), Err(DomainError::EmptyIdentifier));
    }

    #[test]
    fn given_overflowing_number_when_parsing_then_invalid_id() {
        let err = "99999999999999999999999".parse::<UserRef>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));
    }

    #[rstest]
    #[case("520", SignupRef::Id(520))]
    #[case("jane@example.com", SignupRef::Email("jane@example.com".into()))]
    #[case("jane", SignupRef::Login("jane".into()))]
    fn given_identifier_when_parsing_signup_ref_then_detects_kind(
        #[case] input: &str,
        #[case] expected: SignupRef,
    ) {
        assert_eq!(input.parse::<SignupRef>().unwrap(), expected);
    }
}
