//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{MessageService, SignupService, UserResolver};
use crate::config::Settings;
use crate::infrastructure::traits::{
    MessageStore, Notifier, OutboxNotifier, Prompter, RandomSource, SignupStore, StdinPrompter,
    ThreadRandom, UserDirectory,
};
use crate::infrastructure::{InfraError, InfraResult, JsonStore};

/// Container holding the application's dependencies.
///
/// Services are cheap to build and are created on demand.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    pub users: Arc<dyn UserDirectory>,
    pub signups: Arc<dyn SignupStore>,
    pub messages: Arc<dyn MessageStore>,
    pub notifier: Arc<dyn Notifier>,
    pub prompter: Arc<dyn Prompter>,
    pub rng: Arc<dyn RandomSource>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let store = JsonStore::open(&settings.data_file).map_err(|e| InfraError::Store {
            path: settings.data_file.clone(),
            source: e,
        })?;
        let notifier = OutboxNotifier::new(settings.outbox_file.clone());
        Ok(Self::with_deps(
            settings,
            Arc::new(store),
            Arc::new(notifier),
            Arc::new(StdinPrompter),
            Arc::new(ThreadRandom),
        ))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps<S>(
        settings: Settings,
        store: Arc<S>,
        notifier: Arc<dyn Notifier>,
        prompter: Arc<dyn Prompter>,
        rng: Arc<dyn RandomSource>,
    ) -> Self
    where
        S: UserDirectory + SignupStore + MessageStore + 'static,
    {
        let settings = Arc::new(settings);

        Self {
            settings,
            users: store.clone(),
            signups: store.clone(),
            messages: store,
            notifier,
            prompter,
            rng,
        }
    }

    pub fn user_resolver(&self) -> UserResolver {
        UserResolver::new(self.users.clone())
    }

    pub fn signup_service(&self) -> SignupService {
        SignupService::new(
            self.signups.clone(),
            self.users.clone(),
            self.notifier.clone(),
            self.rng.clone(),
        )
    }

    pub fn message_service(&self) -> MessageService {
        MessageService::new(
            self.messages.clone(),
            self.user_resolver(),
            self.rng.clone(),
        )
    }
}
