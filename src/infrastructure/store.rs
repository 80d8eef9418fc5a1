//! JSON document store
//!
//! Keeps users, signups, threads, messages and notices in a single JSON file.
//! Every mutating call rewrites the file through a temp file in the same
//! directory, so a crash never leaves a half-written document behind.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::domain::{
    Message, MessageId, NewMessage, NewSignup, Notice, Participant, Signup, SignupId, Thread,
    ThreadId, User, UserId,
};
use crate::infrastructure::traits::{MessageStore, SignupStore, UserDirectory};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
struct Sequences {
    user: u64,
    signup: u64,
    thread: u64,
    message: u64,
    notice: u64,
}

fn next(seq: &mut u64) -> u64 {
    *seq += 1;
    *seq
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
struct Document {
    sequences: Sequences,
    users: Vec<User>,
    signups: Vec<Signup>,
    threads: Vec<Thread>,
    messages: Vec<Message>,
    notices: Vec<Notice>,
}

/// File-backed implementation of all data-access traits.
#[derive(Debug)]
pub struct JsonStore {
    path: Option<PathBuf>,
    doc: Mutex<Document>,
}

impl JsonStore {
    /// Open the store at `path`. A missing file yields an empty store.
    #[instrument(level = "debug")]
    pub fn open(path: &Path) -> io::Result<Self> {
        let doc = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            if content.trim().is_empty() {
                Document::default()
            } else {
                serde_json::from_str(&content)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
            }
        } else {
            debug!("no data file yet at {}", path.display());
            Document::default()
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            doc: Mutex::new(doc),
        })
    }

    /// Store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            doc: Mutex::new(Document::default()),
        }
    }

    /// Register an account directly, bypassing the signup flow.
    pub fn insert_user(&self, login: &str, email: &str) -> io::Result<User> {
        self.write(|doc| Ok(create_user(doc, login, email, Utc::now().naive_utc())))
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, Document>> {
        self.doc
            .lock()
            .map_err(|_| io::Error::other("store lock poisoned"))
    }

    fn read<T>(&self, f: impl FnOnce(&Document) -> T) -> io::Result<T> {
        let doc = self.lock()?;
        Ok(f(&doc))
    }

    /// Apply a mutation and persist it. The in-memory document is only
    /// replaced once the file has been written.
    fn write<T>(&self, f: impl FnOnce(&mut Document) -> io::Result<T>) -> io::Result<T> {
        let mut doc = self.lock()?;
        let mut draft = doc.clone();
        let result = f(&mut draft)?;
        self.persist(&draft)?;
        *doc = draft;
        Ok(result)
    }

    fn persist(&self, doc: &Document) -> io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, doc)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        tmp.write_all(b"\n")?;
        tmp.persist(path).map_err(|e| e.error)?;
        debug!("persisted store to {}", path.display());
        Ok(())
    }
}

fn create_user(doc: &mut Document, login: &str, email: &str, at: NaiveDateTime) -> User {
    let user = User {
        id: next(&mut doc.sequences.user),
        login: login.to_string(),
        email: email.to_string(),
        registered: at,
    };
    doc.users.push(user.clone());
    user
}

impl UserDirectory for JsonStore {
    fn user_by_id(&self, id: UserId) -> io::Result<Option<User>> {
        self.read(|doc| doc.users.iter().find(|u| u.id == id).cloned())
    }

    fn user_by_login(&self, login: &str) -> io::Result<Option<User>> {
        self.read(|doc| doc.users.iter().find(|u| u.login == login).cloned())
    }

    fn users(&self) -> io::Result<Vec<User>> {
        self.read(|doc| doc.users.clone())
    }
}

impl SignupStore for JsonStore {
    fn signups(&self) -> io::Result<Vec<Signup>> {
        self.read(|doc| doc.signups.clone())
    }

    fn signup(&self, id: SignupId) -> io::Result<Option<Signup>> {
        self.read(|doc| doc.signups.iter().find(|s| s.id == id).cloned())
    }

    fn insert_signup(&self, signup: NewSignup) -> io::Result<Signup> {
        self.write(|doc| {
            let stored = Signup {
                id: next(&mut doc.sequences.signup),
                user_login: signup.user_login,
                user_email: signup.user_email,
                activation_key: signup.activation_key,
                registered: signup.registered,
                active: false,
                date_activated: None,
            };
            doc.signups.push(stored.clone());
            Ok(stored)
        })
    }

    fn delete_signup(&self, id: SignupId) -> io::Result<bool> {
        self.write(|doc| {
            let before = doc.signups.len();
            doc.signups.retain(|s| s.id != id);
            Ok(doc.signups.len() != before)
        })
    }

    fn activate_signup(&self, key: &str, at: NaiveDateTime) -> io::Result<Option<User>> {
        self.write(|doc| {
            let Some(pos) = doc
                .signups
                .iter()
                .position(|s| s.is_pending() && s.activation_key == key)
            else {
                return Ok(None);
            };
            let login_taken = {
                let login = &doc.signups[pos].user_login;
                doc.users.iter().any(|u| &u.login == login)
            };
            if login_taken {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!(
                        "login '{}' already belongs to an account",
                        doc.signups[pos].user_login
                    ),
                ));
            }
            let (login, email) = {
                let signup = &mut doc.signups[pos];
                signup.active = true;
                signup.date_activated = Some(at);
                (signup.user_login.clone(), signup.user_email.clone())
            };
            Ok(Some(create_user(doc, &login, &email, at)))
        })
    }
}

fn join_thread(thread: &mut Thread, user_id: UserId) {
    if thread.participant(user_id).is_none() {
        thread.participants.push(Participant {
            user_id,
            unread_count: 0,
            is_deleted: false,
        });
    }
}

impl MessageStore for JsonStore {
    fn thread(&self, id: ThreadId) -> io::Result<Option<Thread>> {
        self.read(|doc| doc.threads.iter().find(|t| t.id == id).cloned())
    }

    fn threads(&self) -> io::Result<Vec<Thread>> {
        self.read(|doc| doc.threads.clone())
    }

    fn message(&self, id: MessageId) -> io::Result<Option<Message>> {
        self.read(|doc| doc.messages.iter().find(|m| m.id == id).cloned())
    }

    fn thread_messages(&self, thread_id: ThreadId) -> io::Result<Vec<Message>> {
        self.read(|doc| {
            let mut messages: Vec<Message> = doc
                .messages
                .iter()
                .filter(|m| m.thread_id == thread_id)
                .cloned()
                .collect();
            messages.sort_by_key(|m| (m.date_sent, m.id));
            messages
        })
    }

    fn insert_message(&self, message: NewMessage) -> io::Result<Message> {
        self.write(|doc| {
            let thread_id = match message.thread_id {
                Some(id) => id,
                None => {
                    let id = next(&mut doc.sequences.thread);
                    doc.threads.push(Thread {
                        id,
                        participants: Vec::new(),
                    });
                    id
                }
            };
            let thread = doc
                .threads
                .iter_mut()
                .find(|t| t.id == thread_id)
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("thread #{} does not exist", thread_id),
                    )
                })?;

            join_thread(thread, message.sender_id);
            for recipient in &message.recipients {
                join_thread(thread, *recipient);
            }
            for participant in thread.participants.iter_mut() {
                if participant.user_id != message.sender_id {
                    participant.unread_count += 1;
                }
            }

            let stored = Message {
                id: next(&mut doc.sequences.message),
                thread_id,
                sender_id: message.sender_id,
                subject: message.subject,
                message: message.message,
                date_sent: message.date_sent,
                starred_by: Default::default(),
            };
            doc.messages.push(stored.clone());
            Ok(stored)
        })
    }

    fn delete_thread(&self, thread_id: ThreadId, user_id: UserId) -> io::Result<bool> {
        self.write(|doc| {
            let Some(thread) = doc.threads.iter_mut().find(|t| t.id == thread_id) else {
                return Ok(false);
            };
            let Some(participant) = thread
                .participants
                .iter_mut()
                .find(|p| p.user_id == user_id && !p.is_deleted)
            else {
                return Ok(false);
            };
            participant.is_deleted = true;
            participant.unread_count = 0;

            if thread.is_abandoned() {
                debug!("thread #{} abandoned by all participants, purging", thread_id);
                doc.threads.retain(|t| t.id != thread_id);
                doc.messages.retain(|m| m.thread_id != thread_id);
            }
            Ok(true)
        })
    }

    fn set_starred(
        &self,
        message_id: MessageId,
        user_id: UserId,
        starred: bool,
    ) -> io::Result<bool> {
        self.write(|doc| {
            let Some(message) = doc.messages.iter_mut().find(|m| m.id == message_id) else {
                return Ok(false);
            };
            Ok(if starred {
                message.starred_by.insert(user_id)
            } else {
                message.starred_by.remove(&user_id)
            })
        })
    }

    fn notices(&self) -> io::Result<Vec<Notice>> {
        self.read(|doc| {
            let mut notices = doc.notices.clone();
            notices.sort_by(|a, b| (b.date_sent, b.id).cmp(&(a.date_sent, a.id)));
            notices
        })
    }

    fn insert_notice(
        &self,
        subject: &str,
        message: &str,
        date_sent: NaiveDateTime,
    ) -> io::Result<Notice> {
        self.write(|doc| {
            for notice in doc.notices.iter_mut() {
                notice.is_active = false;
            }
            let notice = Notice {
                id: next(&mut doc.sequences.notice),
                subject: subject.to_string(),
                message: message.to_string(),
                date_sent,
                is_active: true,
            };
            doc.notices.push(notice.clone());
            Ok(notice)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_message(thread_id: Option<ThreadId>, from: UserId, to: UserId) -> NewMessage {
        NewMessage {
            thread_id,
            sender_id: from,
            recipients: vec![to],
            subject: "Hi".into(),
            message: "Hello there".into(),
            date_sent: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn given_new_message_without_thread_when_inserting_then_opens_thread() {
        let store = JsonStore::in_memory();
        let msg = store.insert_message(new_message(None, 1, 2)).unwrap();

        let thread = store.thread(msg.thread_id).unwrap().unwrap();
        assert_eq!(thread.participants.len(), 2);
        assert_eq!(thread.participant(1).unwrap().unread_count, 0);
        assert_eq!(thread.participant(2).unwrap().unread_count, 1);
    }

    #[test]
    fn given_missing_thread_when_inserting_then_not_found_and_unchanged() {
        let store = JsonStore::in_memory();
        let err = store.insert_message(new_message(Some(9), 1, 2)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(store.threads().unwrap().is_empty());
    }

    #[test]
    fn given_all_participants_delete_when_deleting_then_thread_purged() {
        let store = JsonStore::in_memory();
        let msg = store.insert_message(new_message(None, 1, 2)).unwrap();

        assert!(store.delete_thread(msg.thread_id, 1).unwrap());
        assert!(store.thread(msg.thread_id).unwrap().is_some());
        assert!(!store.delete_thread(msg.thread_id, 1).unwrap());

        assert!(store.delete_thread(msg.thread_id, 2).unwrap());
        assert!(store.thread(msg.thread_id).unwrap().is_none());
        assert!(store.message(msg.id).unwrap().is_none());
    }

    #[test]
    fn given_login_taken_when_activating_then_already_exists_and_unchanged() {
        let store = JsonStore::in_memory();
        store
            .insert_signup(NewSignup {
                user_login: "dana".into(),
                user_email: "dana@example.com".into(),
                activation_key: "key".into(),
                registered: Utc::now().naive_utc(),
            })
            .unwrap();
        store.insert_user("dana", "other@example.com").unwrap();

        let err = store
            .activate_signup("key", Utc::now().naive_utc())
            .unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(store.users().unwrap().len(), 1);
        assert!(store.signup(1).unwrap().unwrap().is_pending());
    }

    #[test]
    fn given_second_notice_when_inserting_then_only_latest_active() {
        let store = JsonStore::in_memory();
        let now = Utc::now().naive_utc();
        store.insert_notice("a", "first", now).unwrap();
        store.insert_notice("b", "second", now).unwrap();

        let notices = store.notices().unwrap();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices.iter().filter(|n| n.is_active).count(), 1);
        assert_eq!(notices[0].subject, "b");
    }
}
