use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Once};

use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::config::Settings;
use crate::domain::Signup;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{Notifier, Prompter, RandomSource};
use crate::infrastructure::JsonStore;

static TEST_SETUP: Once = Once::new();

/// One-time test setup: plain (uncolored) output and a stderr tracing subscriber.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        colored::control::set_override(false);
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");

    // Create a filter for noisy modules
    let noisy_modules = ["config::"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    // Set up the subscriber with environment filter
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

// ============================================================
// TEST DOUBLES
// ============================================================

/// Prompter answering from a script; answers "no" once the script is exhausted.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<bool>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Questions asked so far.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, question: &str) -> io::Result<bool> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(question.to_string());
        }
        let mut answers = self
            .answers
            .lock()
            .map_err(|_| io::Error::other("prompter lock poisoned"))?;
        Ok(answers.pop_front().unwrap_or(false))
    }
}

/// Notifier recording deliveries, or failing every one.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    fail: bool,
    sent: Mutex<Vec<Signup>>,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<Signup> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn send_activation(&self, signup: &Signup) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "smtp down"));
        }
        self.sent
            .lock()
            .map_err(|_| io::Error::other("notifier lock poisoned"))?
            .push(signup.clone());
        Ok(())
    }
}

/// Deterministic counter-based randomness.
#[derive(Debug, Default)]
pub struct SeqRandom(AtomicU64);

impl RandomSource for SeqRandom {
    fn next_u64(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// In-memory container with test doubles.
pub struct TestEnv {
    pub store: Arc<JsonStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub prompter: Arc<ScriptedPrompter>,
    pub container: ServiceContainer,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::build(Settings::default(), RecordingNotifier::default(), ScriptedPrompter::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self::build(settings, RecordingNotifier::default(), ScriptedPrompter::default())
    }

    pub fn with_notifier(notifier: RecordingNotifier) -> Self {
        Self::build(Settings::default(), notifier, ScriptedPrompter::default())
    }

    pub fn with_prompter(prompter: ScriptedPrompter) -> Self {
        Self::build(Settings::default(), RecordingNotifier::default(), prompter)
    }

    fn build(settings: Settings, notifier: RecordingNotifier, prompter: ScriptedPrompter) -> Self {
        init_test_setup();
        let store = Arc::new(JsonStore::in_memory());
        let notifier = Arc::new(notifier);
        let prompter = Arc::new(prompter);
        let container = ServiceContainer::with_deps(
            settings,
            store.clone(),
            notifier.clone(),
            prompter.clone(),
            Arc::new(SeqRandom::default()),
        );
        Self {
            store,
            notifier,
            prompter,
            container,
        }
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_setup() {
        init_test_setup();
        init_test_setup();
    }
}
