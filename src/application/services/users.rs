//! User identifier resolution

use std::sync::Arc;

use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{User, UserRef};
use crate::infrastructure::traits::UserDirectory;

/// Resolves operator-supplied identifiers to accounts.
#[derive(Clone)]
pub struct UserResolver {
    users: Arc<dyn UserDirectory>,
}

impl UserResolver {
    pub fn new(users: Arc<dyn UserDirectory>) -> Self {
        Self { users }
    }

    /// Resolve a raw identifier (numeric id or login).
    pub fn resolve_str(&self, raw: &str) -> ApplicationResult<User> {
        let user_ref: UserRef = raw
            .parse()
            .map_err(|_| ApplicationError::UserNotFound(raw.to_string()))?;
        self.resolve(&user_ref)
    }

    /// Resolve a parsed identifier.
    pub fn resolve(&self, user_ref: &UserRef) -> ApplicationResult<User> {
        let found = match user_ref {
            UserRef::Id(id) => self.users.user_by_id(*id),
            UserRef::Login(login) => self.users.user_by_login(login),
        }
        .with_context("look up user")?;

        debug!("resolve: {} -> {:?}", user_ref, found.as_ref().map(|u| u.id));
        found.ok_or_else(|| ApplicationError::UserNotFound(user_ref.to_string()))
    }

    /// All registered accounts.
    pub fn all(&self) -> ApplicationResult<Vec<User>> {
        self.users.users().with_context("list users")
    }
}
