//! Signup management service
//!
//! Lists, deletes, activates and re-notifies pending registrations.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument};

use crate::application::text::random_key;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{NewSignup, Signup, SignupId, SignupRef, User};
use crate::infrastructure::traits::{Notifier, RandomSource, SignupStore, UserDirectory};

const ACTIVATION_KEY_LEN: usize = 16;

/// Input for registering a new signup.
#[derive(Debug, Clone, Default)]
pub struct AddSignup {
    pub user_login: String,
    pub user_email: String,
    pub activation_key: Option<String>,
}

/// Signup management service.
pub struct SignupService {
    store: Arc<dyn SignupStore>,
    users: Arc<dyn UserDirectory>,
    notifier: Arc<dyn Notifier>,
    rng: Arc<dyn RandomSource>,
}

impl SignupService {
    pub fn new(
        store: Arc<dyn SignupStore>,
        users: Arc<dyn UserDirectory>,
        notifier: Arc<dyn Notifier>,
        rng: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            store,
            users,
            notifier,
            rng,
        }
    }

    /// Register a pending signup.
    ///
    /// Login and email must not belong to an account or another pending signup.
    #[instrument(skip(self))]
    pub fn add(&self, input: AddSignup) -> ApplicationResult<Signup> {
        let login = input.user_login.trim();
        let email = input.user_email.trim();
        if login.is_empty() {
            return Err(ApplicationError::InvalidInput(
                "A user login is required.".into(),
            ));
        }
        if !email.contains('@') {
            return Err(ApplicationError::InvalidInput(format!(
                "Invalid email address: {}",
                email
            )));
        }
        if self
            .users
            .user_by_login(login)
            .with_context("look up user")?
            .is_some()
        {
            return Err(ApplicationError::InvalidInput(format!(
                "A user with login '{}' already exists.",
                login
            )));
        }
        let taken = self.pending()?.into_iter().any(|s| {
            s.user_login == login || s.user_email.eq_ignore_ascii_case(email)
        });
        if taken {
            return Err(ApplicationError::InvalidInput(format!(
                "A pending signup already exists for '{}'.",
                login
            )));
        }

        let activation_key = match input.activation_key {
            Some(key) if !key.trim().is_empty() => key.trim().to_string(),
            _ => random_key(self.rng.as_ref(), ACTIVATION_KEY_LEN),
        };
        let signup = self
            .store
            .insert_signup(NewSignup {
                user_login: login.to_string(),
                user_email: email.to_string(),
                activation_key,
                registered: Utc::now().naive_utc(),
            })
            .with_context("Could not add user signup")?;
        debug!("add: created signup #{}", signup.id);
        Ok(signup)
    }

    /// Find a signup by id, email or login.
    pub fn get(&self, signup_ref: &SignupRef) -> ApplicationResult<Signup> {
        let found = match signup_ref {
            SignupRef::Id(id) => self.store.signup(*id).with_context("look up signup")?,
            SignupRef::Email(email) => self
                .all()?
                .into_iter()
                .find(|s| s.user_email.eq_ignore_ascii_case(email)),
            SignupRef::Login(login) => self.all()?.into_iter().find(|s| &s.user_login == login),
        };
        found.ok_or_else(|| {
            ApplicationError::NotFound("No signup found by that identifier.".into())
        })
    }

    /// Delete a single signup.
    #[instrument(skip(self))]
    pub fn delete(&self, signup_ref: &SignupRef) -> ApplicationResult<Signup> {
        let signup = self.get(signup_ref)?;
        let removed = self
            .store
            .delete_signup(signup.id)
            .with_context("Could not delete signup")?;
        if !removed {
            return Err(ApplicationError::failed("Could not delete signup."));
        }
        Ok(signup)
    }

    /// Activate a pending signup and return the new account.
    #[instrument(skip(self))]
    pub fn activate(&self, activation_key: &str) -> ApplicationResult<User> {
        let key = activation_key.trim();
        if key.is_empty() {
            return Err(ApplicationError::InvalidInput(
                "An activation key is required.".into(),
            ));
        }
        let user = self
            .store
            .activate_signup(key, Utc::now().naive_utc())
            .with_context("Signup not activated")?
            .ok_or_else(|| ApplicationError::NotFound("Signup not activated.".into()))?;
        debug!("activate: key {} -> user #{}", key, user.id);
        Ok(user)
    }

    /// Re-send the activation email of a pending signup.
    ///
    /// Email and key must match the stored signup. Stored state is not touched.
    #[instrument(skip(self))]
    pub fn resend(&self, id: SignupId, email: &str, activation_key: &str) -> ApplicationResult<()> {
        let signup = self.get(&SignupRef::Id(id))?;
        if !signup.is_pending() {
            return Err(ApplicationError::InvalidInput(format!(
                "Signup #{} is already activated.",
                id
            )));
        }
        if !signup.user_email.eq_ignore_ascii_case(email.trim())
            || signup.activation_key != activation_key.trim()
        {
            return Err(ApplicationError::InvalidInput(
                "Email or activation key does not match the signup.".into(),
            ));
        }
        self.notifier
            .send_activation(&signup)
            .map_err(|e| ApplicationError::OperationFailed {
                context: "This email could not be sent.".into(),
                source: Some(Box::new(e)),
            })
    }

    /// Pending signups ordered by id, optionally capped.
    pub fn list(&self, limit: Option<usize>) -> ApplicationResult<Vec<Signup>> {
        let mut pending = self.pending()?;
        if let Some(limit) = limit {
            pending.truncate(limit);
        }
        Ok(pending)
    }

    fn all(&self) -> ApplicationResult<Vec<Signup>> {
        self.store.signups().with_context("list signups")
    }

    fn pending(&self) -> ApplicationResult<Vec<Signup>> {
        let mut pending: Vec<Signup> = self.all()?.into_iter().filter(Signup::is_pending).collect();
        pending.sort_by_key(|s| s.id);
        Ok(pending)
    }
}
