//! I/O boundary traits for testability
//!
//! These traits abstract the data layer and the operator's terminal,
//! allowing services to be tested with in-memory or scripted implementations.

use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use rand::Rng;

use crate::domain::{
    format_date, Message, MessageId, NewMessage, NewSignup, Notice, Signup, SignupId, Thread,
    ThreadId, User, UserId,
};

/// Read access to registered accounts.
pub trait UserDirectory: Send + Sync {
    /// Look up a user by numeric id.
    fn user_by_id(&self, id: UserId) -> io::Result<Option<User>>;

    /// Look up a user by login name.
    fn user_by_login(&self, login: &str) -> io::Result<Option<User>>;

    /// All users, ordered by id.
    fn users(&self) -> io::Result<Vec<User>>;
}

/// Persistence for pending registrations.
pub trait SignupStore: Send + Sync {
    /// All signups (pending and activated), ordered by id.
    fn signups(&self) -> io::Result<Vec<Signup>>;

    /// Look up a signup by id.
    fn signup(&self, id: SignupId) -> io::Result<Option<Signup>>;

    /// Store a new pending signup.
    fn insert_signup(&self, signup: NewSignup) -> io::Result<Signup>;

    /// Remove a signup. Returns false if nothing was removed.
    fn delete_signup(&self, id: SignupId) -> io::Result<bool>;

    /// Activate the pending signup holding `key` and create its account.
    ///
    /// Returns None if no pending signup has that key.
    fn activate_signup(&self, key: &str, at: NaiveDateTime) -> io::Result<Option<User>>;
}

/// Persistence for threads, messages and notices.
pub trait MessageStore: Send + Sync {
    /// Look up a thread by id.
    fn thread(&self, id: ThreadId) -> io::Result<Option<Thread>>;

    /// All threads, ordered by id.
    fn threads(&self) -> io::Result<Vec<Thread>>;

    /// Look up a message by id.
    fn message(&self, id: MessageId) -> io::Result<Option<Message>>;

    /// Messages of a thread, oldest first.
    fn thread_messages(&self, thread_id: ThreadId) -> io::Result<Vec<Message>>;

    /// Store a message, opening a new thread when `thread_id` is None.
    ///
    /// Fails with `NotFound` if the given thread does not exist.
    fn insert_message(&self, message: NewMessage) -> io::Result<Message>;

    /// Delete a thread on behalf of one participant.
    ///
    /// Returns false if the user is not an active participant.
    fn delete_thread(&self, thread_id: ThreadId, user_id: UserId) -> io::Result<bool>;

    /// Set or clear a user's star on a message. Returns true if the flag changed.
    fn set_starred(&self, message_id: MessageId, user_id: UserId, starred: bool)
        -> io::Result<bool>;

    /// All notices, newest first.
    fn notices(&self) -> io::Result<Vec<Notice>>;

    /// Store a notice and make it the only active one.
    fn insert_notice(
        &self,
        subject: &str,
        message: &str,
        date_sent: NaiveDateTime,
    ) -> io::Result<Notice>;
}

/// Outgoing notifications.
pub trait Notifier: Send + Sync {
    /// Deliver the activation email for a pending signup.
    fn send_activation(&self, signup: &Signup) -> io::Result<()>;
}

/// Interactive yes/no confirmation.
pub trait Prompter: Send + Sync {
    /// Ask the operator to confirm. Returns true on yes.
    fn confirm(&self, question: &str) -> io::Result<bool>;
}

/// Source of randomness for generated content and user picks.
pub trait RandomSource: Send + Sync {
    fn next_u64(&self) -> u64;

    /// Uniform-ish index in `0..len`. `len` must be non-zero.
    fn index(&self, len: usize) -> usize {
        (self.next_u64() % len as u64) as usize
    }
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

#[derive(Serialize)]
struct OutboxEntry<'a> {
    to: &'a str,
    subject: &'a str,
    signup_id: SignupId,
    user_login: &'a str,
    activation_key: &'a str,
    queued_at: String,
}

/// Notifier that appends activation mail to a JSON-lines outbox file.
#[derive(Debug, Clone)]
pub struct OutboxNotifier {
    path: PathBuf,
}

impl OutboxNotifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Notifier for OutboxNotifier {
    fn send_activation(&self, signup: &Signup) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let entry = OutboxEntry {
            to: &signup.user_email,
            subject: "Activate your account",
            signup_id: signup.id,
            user_login: &signup.user_login,
            activation_key: &signup.activation_key,
            queued_at: format_date(&Utc::now().naive_utc()),
        };
        let line = serde_json::to_string(&entry).map_err(io::Error::other)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)
    }
}

/// Prompter reading answers from stdin.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn confirm(&self, question: &str) -> io::Result<bool> {
        let mut stderr = io::stderr();
        write!(stderr, "{} [y/n] ", question)?;
        stderr.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }
}

/// Randomness drawn from the thread-local generator.
#[derive(Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_u64(&self) -> u64 {
        rand::thread_rng().gen::<u64>()
    }

    fn index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::text::random_key;
    use std::collections::HashSet;

    #[test]
    fn given_thread_random_when_generating_keys_then_every_position_varies() {
        let keys: Vec<String> = (0..200).map(|_| random_key(&ThreadRandom, 16)).collect();

        for pos in 0..16 {
            let seen: HashSet<u8> = keys.iter().map(|k| k.as_bytes()[pos]).collect();
            assert!(seen.len() > 1, "position {} never varies", pos);
        }
    }

    #[test]
    fn given_thread_random_when_picking_index_then_in_range() {
        for len in 1..20 {
            assert!(ThreadRandom.index(len) < len);
        }
    }
}
