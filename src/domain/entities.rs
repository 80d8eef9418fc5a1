//! Domain entities: core data structures

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

pub type UserId = u64;
pub type SignupId = u64;
pub type ThreadId = u64;
pub type MessageId = u64;
pub type NoticeId = u64;

/// Display and input format for all timestamps.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a `YYYY-MM-DD HH:MM:SS` timestamp.
pub fn parse_date(value: &str) -> Result<NaiveDateTime, DomainError> {
    NaiveDateTime::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        DomainError::InvalidDate {
            value: value.to_string(),
        }
    })
}

/// Render a timestamp in `YYYY-MM-DD HH:MM:SS` form.
pub fn format_date(date: &NaiveDateTime) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub login: String,
    pub email: String,
    pub registered: NaiveDateTime,
}

/// A registration awaiting activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signup {
    pub id: SignupId,
    pub user_login: String,
    pub user_email: String,
    pub activation_key: String,
    pub registered: NaiveDateTime,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub date_activated: Option<NaiveDateTime>,
}

impl Signup {
    pub fn is_pending(&self) -> bool {
        !self.active
    }
}

/// Input for a new signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSignup {
    pub user_login: String,
    pub user_email: String,
    pub activation_key: String,
    pub registered: NaiveDateTime,
}

/// Per-user view of a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: UserId,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub is_deleted: bool,
}

/// A conversation between participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    pub participants: Vec<Participant>,
}

impl Thread {
    pub fn participant(&self, user_id: UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    /// A user can access a thread they take part in and have not deleted.
    pub fn has_access(&self, user_id: UserId) -> bool {
        self.participant(user_id).is_some_and(|p| !p.is_deleted)
    }

    pub fn is_unread_for(&self, user_id: UserId) -> bool {
        self.participant(user_id)
            .is_some_and(|p| p.unread_count > 0)
    }

    /// True once every participant has deleted the thread.
    pub fn is_abandoned(&self) -> bool {
        self.participants.iter().all(|p| p.is_deleted)
    }
}

/// A single message inside a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub thread_id: ThreadId,
    pub sender_id: UserId,
    pub subject: String,
    pub message: String,
    pub date_sent: NaiveDateTime,
    #[serde(default)]
    pub starred_by: BTreeSet<UserId>,
}

impl Message {
    pub fn is_starred_by(&self, user_id: UserId) -> bool {
        self.starred_by.contains(&user_id)
    }

    /// Case-insensitive substring match on subject or body.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.subject.to_lowercase().contains(&needle)
            || self.message.to_lowercase().contains(&needle)
    }
}

/// Input for a new message.
///
/// Without `thread_id` a new thread is opened between sender and recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub thread_id: Option<ThreadId>,
    pub sender_id: UserId,
    pub recipients: Vec<UserId>,
    pub subject: String,
    pub message: String,
    pub date_sent: NaiveDateTime,
}

/// A sitewide announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub id: NoticeId,
    pub subject: String,
    pub message: String,
    pub date_sent: NaiveDateTime,
    pub is_active: bool,
}

impl Notice {
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.subject.to_lowercase().contains(&needle)
            || self.message.to_lowercase().contains(&needle)
    }
}

/// Message folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageBox {
    #[default]
    Sentbox,
    Inbox,
    Notices,
}

impl MessageBox {
    /// Parse a box name; unknown names fall back to the sentbox.
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "sentbox" => Self::Sentbox,
            "inbox" => Self::Inbox,
            "notices" => Self::Notices,
            _ => Self::default(),
        }
    }
}

/// Read-state filter for listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadFilter {
    #[default]
    All,
    Read,
    Unread,
}

impl ReadFilter {
    /// Parse a filter name; unknown names fall back to `all`.
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Self::All,
            "read" => Self::Read,
            "unread" => Self::Unread,
            _ => Self::default(),
        }
    }

    pub fn accepts(&self, unread: bool) -> bool {
        match self {
            Self::All => true,
            Self::Read => !unread,
            Self::Unread => unread,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread() -> Thread {
        Thread {
            id: 1,
            participants: vec![
                Participant {
                    user_id: 1,
                    unread_count: 0,
                    is_deleted: false,
                },
                Participant {
                    user_id: 2,
                    unread_count: 3,
                    is_deleted: true,
                },
            ],
        }
    }

    #[test]
    fn given_deleted_participant_when_checking_access_then_denied() {
        let t = thread();
        assert!(t.has_access(1));
        assert!(!t.has_access(2));
        assert!(!t.has_access(3));
        assert!(!t.is_abandoned());
    }

    #[test]
    fn given_unknown_box_when_parsing_then_falls_back_to_sentbox() {
        assert_eq!(MessageBox::parse_or_default("inbox"), MessageBox::Inbox);
        assert_eq!(MessageBox::parse_or_default("NOTICES"), MessageBox::Notices);
        assert_eq!(MessageBox::parse_or_default("trash"), MessageBox::Sentbox);
        assert_eq!(ReadFilter::parse_or_default("bogus"), ReadFilter::All);
    }

    #[test]
    fn given_date_string_when_parsing_then_roundtrips_display_format() {
        let date = parse_date("2024-03-01 12:30:00").unwrap();
        assert_eq!(format_date(&date), "2024-03-01 12:30:00");
        assert!(parse_date("yesterday").is_err());
    }
}
