//! Private message service
//!
//! Creates, lists, stars and deletes messages, and sends sitewide notices.

use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use tracing::{debug, instrument};

use crate::application::services::UserResolver;
use crate::application::text::random_text;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{
    Message, MessageBox, MessageId, NewMessage, Notice, ReadFilter, Thread, ThreadId, User,
};
use crate::infrastructure::traits::{MessageStore, RandomSource};

pub const DEFAULT_SUBJECT: &str = "Message Subject";
pub const DEFAULT_NOTICE_SUBJECT: &str = "Notice Subject";

/// Input for creating a message. Unset fields get defaults.
#[derive(Debug, Clone, Default)]
pub struct CreateMessage {
    pub from: String,
    pub to: String,
    pub subject: Option<String>,
    pub content: Option<String>,
    pub thread_id: Option<ThreadId>,
    pub date_sent: Option<NaiveDateTime>,
}

/// Filters for listing a user's messages.
#[derive(Debug, Clone)]
pub struct ListMessages {
    pub user: Option<String>,
    pub mailbox: MessageBox,
    pub filter: ReadFilter,
    pub search: Option<String>,
    pub count: usize,
}

/// What a star or unstar applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarTarget {
    Message(MessageId),
    Thread(ThreadId),
}

/// Private message service.
pub struct MessageService {
    store: Arc<dyn MessageStore>,
    users: UserResolver,
    rng: Arc<dyn RandomSource>,
}

impl MessageService {
    pub fn new(
        store: Arc<dyn MessageStore>,
        users: UserResolver,
        rng: Arc<dyn RandomSource>,
    ) -> Self {
        Self { store, users, rng }
    }

    pub fn resolve_user(&self, raw: &str) -> ApplicationResult<User> {
        self.users.resolve_str(raw)
    }

    /// Create a message, opening a thread unless `thread_id` is given.
    ///
    /// Both users are resolved before anything is written.
    #[instrument(skip(self))]
    pub fn create(&self, input: CreateMessage) -> ApplicationResult<Message> {
        let sender = self.users.resolve_str(&input.from)?;
        let recipient = self.users.resolve_str(&input.to)?;

        if let Some(thread_id) = input.thread_id {
            self.thread(thread_id)?;
        }

        let message = NewMessage {
            thread_id: input.thread_id,
            sender_id: sender.id,
            recipients: vec![recipient.id],
            subject: input.subject.unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            message: input
                .content
                .unwrap_or_else(|| random_text(self.rng.as_ref())),
            date_sent: input.date_sent.unwrap_or_else(|| Utc::now().naive_utc()),
        };
        let created = self
            .store
            .insert_message(message)
            .map_err(|e| ApplicationError::OperationFailed {
                context: "Could not add a message.".into(),
                source: Some(Box::new(e)),
            })?;
        if created.thread_id == 0 {
            return Err(ApplicationError::failed("Could not add a message."));
        }
        debug!("create: message #{} in thread #{}", created.id, created.thread_id);
        Ok(created)
    }

    /// Delete a thread for `user`, who must be able to access it.
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub fn delete_thread(&self, thread_id: ThreadId, user: &User) -> ApplicationResult<()> {
        self.check_access(thread_id, user)?;
        let deleted = self
            .store
            .delete_thread(thread_id, user.id)
            .with_context("Could not delete the thread")?;
        if !deleted {
            return Err(ApplicationError::failed("Could not delete the thread."));
        }
        Ok(())
    }

    pub fn get(&self, id: MessageId) -> ApplicationResult<Message> {
        self.store
            .message(id)
            .with_context("look up message")?
            .ok_or_else(|| ApplicationError::NotFound("No message found.".into()))
    }

    /// Messages of one box for a user, newest first, capped at `count`.
    ///
    /// Notices are returned as messages with thread and sender id 0.
    #[instrument(skip(self))]
    pub fn list(&self, query: ListMessages) -> ApplicationResult<Vec<Message>> {
        let user = match query.user.as_deref() {
            Some(raw) => self.users.resolve_str(raw)?,
            None => return Err(ApplicationError::UserNotFound("(none given)".into())),
        };
        let search = query.search.as_deref().filter(|s| !s.trim().is_empty());

        let mut found: Vec<Message> = match query.mailbox {
            MessageBox::Notices => self
                .store
                .notices()
                .with_context("list notices")?
                .into_iter()
                .filter(|n| search.map_or(true, |s| n.matches(s)))
                .map(notice_as_message)
                .collect(),
            mailbox => {
                let threads = self.store.threads().with_context("list threads")?;
                let mut found = Vec::new();
                for thread in threads.iter().filter(|t| t.has_access(user.id)) {
                    if !query.filter.accepts(thread.is_unread_for(user.id)) {
                        continue;
                    }
                    let messages = self
                        .store
                        .thread_messages(thread.id)
                        .with_context("list thread messages")?;
                    found.extend(messages.into_iter().filter(|m| {
                        let in_box = match mailbox {
                            MessageBox::Inbox => m.sender_id != user.id,
                            _ => m.sender_id == user.id,
                        };
                        in_box && search.map_or(true, |s| m.matches(s))
                    }));
                }
                found
            }
        };

        found.sort_by(|a, b| (b.date_sent, b.id).cmp(&(a.date_sent, a.id)));
        found.truncate(query.count);
        debug!("list: {} messages for user #{}", found.len(), user.id);

        if found.is_empty() {
            return Err(ApplicationError::NotFound("No message found.".into()));
        }
        Ok(found)
    }

    /// Create `count` messages between random distinct users.
    ///
    /// `progress` is called after each message with (done, total).
    #[instrument(skip(self, progress))]
    pub fn generate(
        &self,
        count: usize,
        thread_id: Option<ThreadId>,
        progress: &mut dyn FnMut(usize, usize),
    ) -> ApplicationResult<usize> {
        let users = self.users.all()?;
        if users.len() < 2 {
            return Err(ApplicationError::failed(
                "At least two users are needed to generate messages.",
            ));
        }
        if let Some(thread_id) = thread_id {
            self.thread(thread_id)?;
        }

        for done in 1..=count {
            let from = &users[self.rng.index(users.len())];
            // pick from the remaining users so sender and recipient differ
            let mut to_idx = self.rng.index(users.len() - 1);
            if users[to_idx].id == from.id {
                to_idx = users.len() - 1;
            }
            let to = &users[to_idx];

            self.create(CreateMessage {
                from: from.id.to_string(),
                to: to.id.to_string(),
                thread_id,
                ..Default::default()
            })?;
            progress(done, count);
        }
        Ok(count)
    }

    /// Star a message for `user`. A thread target stars its first message.
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub fn star(&self, target: StarTarget, user: &User) -> ApplicationResult<Message> {
        let message = match target {
            StarTarget::Message(id) => self.get(id)?,
            StarTarget::Thread(thread_id) => self
                .store
                .thread_messages(thread_id)
                .with_context("list thread messages")?
                .into_iter()
                .next()
                .ok_or_else(|| ApplicationError::NotFound("No message found.".into()))?,
        };
        self.check_access(message.thread_id, user)?;

        if message.is_starred_by(user.id) {
            return Err(ApplicationError::failed("The message is already starred."));
        }
        let changed = self
            .store
            .set_starred(message.id, user.id, true)
            .with_context("Message was not starred")?;
        if !changed {
            return Err(ApplicationError::failed("Message was not starred."));
        }
        Ok(message)
    }

    /// Remove `user`'s star. A thread target unstars all its messages.
    ///
    /// Returns the number of messages unstarred.
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub fn unstar(&self, target: StarTarget, user: &User) -> ApplicationResult<usize> {
        let (thread_id, candidates) = match target {
            StarTarget::Message(id) => {
                let message = self.get(id)?;
                (message.thread_id, vec![message])
            }
            StarTarget::Thread(thread_id) => {
                self.thread(thread_id)?;
                let messages = self
                    .store
                    .thread_messages(thread_id)
                    .with_context("list thread messages")?;
                (thread_id, messages)
            }
        };
        self.check_access(thread_id, user)?;

        let mut unstarred = 0;
        for message in candidates.iter().filter(|m| m.is_starred_by(user.id)) {
            if self
                .store
                .set_starred(message.id, user.id, false)
                .with_context("Message was not unstarred")?
            {
                unstarred += 1;
            }
        }
        if unstarred == 0 {
            return Err(ApplicationError::failed("Message was not unstarred."));
        }
        Ok(unstarred)
    }

    /// Publish a sitewide notice. Empty subject or content fails the send.
    #[instrument(skip(self))]
    pub fn send_notice(
        &self,
        subject: Option<String>,
        content: Option<String>,
    ) -> ApplicationResult<Notice> {
        let subject = subject.unwrap_or_else(|| DEFAULT_NOTICE_SUBJECT.to_string());
        let content = content.unwrap_or_else(|| random_text(self.rng.as_ref()));
        if subject.trim().is_empty() || content.trim().is_empty() {
            return Err(ApplicationError::failed("Notice was not sent."));
        }
        self.store
            .insert_notice(&subject, &content, Utc::now().naive_utc())
            .map_err(|e| ApplicationError::OperationFailed {
                context: "Notice was not sent.".into(),
                source: Some(Box::new(e)),
            })
    }

    fn thread(&self, thread_id: ThreadId) -> ApplicationResult<Thread> {
        self.store
            .thread(thread_id)
            .with_context("look up thread")?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("No thread found with id #{}.", thread_id))
            })
    }

    fn check_access(&self, thread_id: ThreadId, user: &User) -> ApplicationResult<()> {
        let thread = self.thread(thread_id)?;
        if !thread.has_access(user.id) {
            return Err(ApplicationError::AccessDenied {
                thread_id,
                user_id: user.id,
            });
        }
        Ok(())
    }
}

fn notice_as_message(notice: Notice) -> Message {
    Message {
        id: notice.id,
        thread_id: 0,
        sender_id: 0,
        subject: notice.subject,
        message: notice.message,
        date_sent: notice.date_sent,
        starred_by: Default::default(),
    }
}
