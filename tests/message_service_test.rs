//! Tests for MessageService

use bpcli::application::services::{
    CreateMessage, ListMessages, StarTarget, DEFAULT_NOTICE_SUBJECT, DEFAULT_SUBJECT,
};
use bpcli::application::ApplicationError;
use bpcli::domain::{parse_date, Message, MessageBox, ReadFilter, User};
use bpcli::infrastructure::traits::MessageStore;
use bpcli::util::testing::TestEnv;
use rstest::rstest;

struct Fixture {
    env: TestEnv,
    alice: User,
    bob: User,
    carol: User,
}

fn fixture() -> Fixture {
    let env = TestEnv::new();
    let alice = env.store.insert_user("alice", "alice@example.com").unwrap();
    let bob = env.store.insert_user("bob", "bob@example.com").unwrap();
    let carol = env.store.insert_user("carol", "carol@example.com").unwrap();
    Fixture {
        env,
        alice,
        bob,
        carol,
    }
}

fn send(f: &Fixture, from: &User, to: &User, subject: &str, date: &str) -> Message {
    f.env
        .container
        .message_service()
        .create(CreateMessage {
            from: from.id.to_string(),
            to: to.login.clone(),
            subject: Some(subject.into()),
            content: Some(format!("body of {}", subject)),
            date_sent: Some(parse_date(date).unwrap()),
            ..Default::default()
        })
        .expect("create message")
}

fn query(user: &User, mailbox: MessageBox) -> ListMessages {
    ListMessages {
        user: Some(user.login.clone()),
        mailbox,
        filter: ReadFilter::All,
        search: None,
        count: 10,
    }
}

#[test]
fn given_defaults_when_creating_then_default_subject_and_random_content() {
    let f = fixture();

    let message = f
        .env
        .container
        .message_service()
        .create(CreateMessage {
            from: "alice".into(),
            to: "bob".into(),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(message.subject, DEFAULT_SUBJECT);
    assert!(!message.message.is_empty());
    assert_eq!(message.sender_id, f.alice.id);
    let thread = f.env.store.thread(message.thread_id).unwrap().unwrap();
    assert!(thread.has_access(f.bob.id));
    assert!(thread.is_unread_for(f.bob.id));
    assert!(!thread.is_unread_for(f.alice.id));
}

#[rstest]
#[case("nobody", "bob")]
#[case("alice", "999")]
fn given_unresolvable_user_when_creating_then_user_not_found_and_nothing_stored(
    #[case] from: &str,
    #[case] to: &str,
) {
    let f = fixture();

    let err = f
        .env
        .container
        .message_service()
        .create(CreateMessage {
            from: from.into(),
            to: to.into(),
            ..Default::default()
        })
        .unwrap_err();

    assert!(matches!(err, ApplicationError::UserNotFound(_)));
    assert!(f.env.store.threads().unwrap().is_empty());
}

#[test]
fn given_missing_thread_when_replying_then_not_found() {
    let f = fixture();

    let err = f
        .env
        .container
        .message_service()
        .create(CreateMessage {
            from: "alice".into(),
            to: "bob".into(),
            thread_id: Some(77),
            ..Default::default()
        })
        .unwrap_err();

    assert!(matches!(err, ApplicationError::NotFound(_)));
}

#[test]
fn given_thread_when_replying_then_message_joins_thread() {
    let f = fixture();
    let first = send(&f, &f.alice, &f.bob, "hello", "2024-01-01 10:00:00");

    let reply = f
        .env
        .container
        .message_service()
        .create(CreateMessage {
            from: "bob".into(),
            to: "alice".into(),
            thread_id: Some(first.thread_id),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(reply.thread_id, first.thread_id);
    assert_eq!(f.env.store.threads().unwrap().len(), 1);
}

#[test]
fn given_no_user_when_listing_then_user_not_found() {
    let f = fixture();
    let mut q = query(&f.alice, MessageBox::Sentbox);
    q.user = None;

    let err = f.env.container.message_service().list(q).unwrap_err();

    assert!(matches!(err, ApplicationError::UserNotFound(_)));
}

#[test]
fn given_conversation_when_listing_boxes_then_split_by_sender_newest_first() {
    let f = fixture();
    send(&f, &f.alice, &f.bob, "one", "2024-01-01 10:00:00");
    send(&f, &f.alice, &f.carol, "two", "2024-01-02 10:00:00");
    send(&f, &f.bob, &f.alice, "three", "2024-01-03 10:00:00");
    let service = f.env.container.message_service();

    let sent = service.list(query(&f.alice, MessageBox::Sentbox)).unwrap();
    let inbox = service.list(query(&f.alice, MessageBox::Inbox)).unwrap();

    assert_eq!(
        sent.iter().map(|m| m.subject.as_str()).collect::<Vec<_>>(),
        vec!["two", "one"]
    );
    assert_eq!(
        inbox.iter().map(|m| m.subject.as_str()).collect::<Vec<_>>(),
        vec!["three"]
    );
}

#[test]
fn given_many_messages_when_listing_with_count_then_capped() {
    let f = fixture();
    for day in 1..=5 {
        send(&f, &f.alice, &f.bob, "s", &format!("2024-01-0{} 10:00:00", day));
    }
    let mut q = query(&f.alice, MessageBox::Sentbox);
    q.count = 3;

    let listed = f.env.container.message_service().list(q).unwrap();

    assert_eq!(listed.len(), 3);
}

#[test]
fn given_search_when_listing_then_case_insensitive_match() {
    let f = fixture();
    send(&f, &f.alice, &f.bob, "Quarterly Report", "2024-01-01 10:00:00");
    send(&f, &f.alice, &f.bob, "lunch", "2024-01-02 10:00:00");
    let mut q = query(&f.alice, MessageBox::Sentbox);
    q.search = Some("REPORT".into());

    let listed = f.env.container.message_service().list(q).unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].subject, "Quarterly Report");
}

#[rstest]
#[case(ReadFilter::Unread, 1)]
#[case(ReadFilter::Read, 0)]
#[case(ReadFilter::All, 1)]
fn given_unread_thread_when_filtering_inbox_then_matches_read_state(
    #[case] filter: ReadFilter,
    #[case] expected: usize,
) {
    let f = fixture();
    send(&f, &f.alice, &f.bob, "ping", "2024-01-01 10:00:00");
    let mut q = query(&f.bob, MessageBox::Inbox);
    q.filter = filter;

    let listed = f.env.container.message_service().list(q);

    match expected {
        0 => assert!(matches!(listed, Err(ApplicationError::NotFound(_)))),
        n => assert_eq!(listed.unwrap().len(), n),
    }
}

#[test]
fn given_notice_when_listing_notices_then_mapped_to_message() {
    let f = fixture();
    let service = f.env.container.message_service();
    service.send_notice(None, Some("Maintenance tonight".into())).unwrap();

    let listed = service.list(query(&f.carol, MessageBox::Notices)).unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].subject, DEFAULT_NOTICE_SUBJECT);
    assert_eq!(listed[0].thread_id, 0);
    assert_eq!(listed[0].sender_id, 0);
}

#[test]
fn given_outsider_when_deleting_thread_then_access_denied_and_thread_kept() {
    let f = fixture();
    let message = send(&f, &f.alice, &f.bob, "private", "2024-01-01 10:00:00");

    let err = f
        .env
        .container
        .message_service()
        .delete_thread(message.thread_id, &f.carol)
        .unwrap_err();

    assert!(matches!(err, ApplicationError::AccessDenied { .. }));
    let thread = f.env.store.thread(message.thread_id).unwrap().unwrap();
    assert!(thread.has_access(f.alice.id));
    assert!(thread.has_access(f.bob.id));
}

#[test]
fn given_both_participants_delete_when_deleting_then_thread_purged() {
    let f = fixture();
    let message = send(&f, &f.alice, &f.bob, "bye", "2024-01-01 10:00:00");
    let service = f.env.container.message_service();

    service.delete_thread(message.thread_id, &f.alice).unwrap();
    assert!(f.env.store.thread(message.thread_id).unwrap().is_some());
    service.delete_thread(message.thread_id, &f.bob).unwrap();

    assert!(f.env.store.thread(message.thread_id).unwrap().is_none());
    assert!(f.env.store.message(message.id).unwrap().is_none());
}

#[test]
fn given_missing_message_when_getting_then_no_message_found() {
    let f = fixture();

    let err = f.env.container.message_service().get(5).unwrap_err();

    assert_eq!(err.to_string(), "No message found.");
}

#[test]
fn given_message_when_starring_twice_then_already_starred() {
    let f = fixture();
    let message = send(&f, &f.alice, &f.bob, "star me", "2024-01-01 10:00:00");
    let service = f.env.container.message_service();

    service.star(StarTarget::Message(message.id), &f.bob).unwrap();
    let err = service
        .star(StarTarget::Message(message.id), &f.bob)
        .unwrap_err();

    assert_eq!(err.to_string(), "The message is already starred.");
    assert!(f
        .env
        .store
        .message(message.id)
        .unwrap()
        .unwrap()
        .is_starred_by(f.bob.id));
}

#[test]
fn given_outsider_when_starring_then_access_denied() {
    let f = fixture();
    let message = send(&f, &f.alice, &f.bob, "star me", "2024-01-01 10:00:00");

    let err = f
        .env
        .container
        .message_service()
        .star(StarTarget::Thread(message.thread_id), &f.carol)
        .unwrap_err();

    assert!(matches!(err, ApplicationError::AccessDenied { .. }));
}

#[test]
fn given_starred_thread_when_unstarring_by_thread_then_all_unstarred() {
    let f = fixture();
    let first = send(&f, &f.alice, &f.bob, "a", "2024-01-01 10:00:00");
    let second = f
        .env
        .container
        .message_service()
        .create(CreateMessage {
            from: "bob".into(),
            to: "alice".into(),
            thread_id: Some(first.thread_id),
            date_sent: Some(parse_date("2024-01-02 10:00:00").unwrap()),
            ..Default::default()
        })
        .unwrap();
    let service = f.env.container.message_service();
    service.star(StarTarget::Message(first.id), &f.alice).unwrap();
    service.star(StarTarget::Message(second.id), &f.alice).unwrap();

    let unstarred = service
        .unstar(StarTarget::Thread(first.thread_id), &f.alice)
        .unwrap();

    assert_eq!(unstarred, 2);
    let err = service
        .unstar(StarTarget::Message(first.id), &f.alice)
        .unwrap_err();
    assert_eq!(err.to_string(), "Message was not unstarred.");
}

#[test]
fn given_empty_subject_when_sending_notice_then_not_sent() {
    let f = fixture();

    let err = f
        .env
        .container
        .message_service()
        .send_notice(Some("  ".into()), Some("content".into()))
        .unwrap_err();

    assert_eq!(err.to_string(), "Notice was not sent.");
    assert!(f.env.store.notices().unwrap().is_empty());
}

#[test]
fn given_users_when_generating_then_count_messages_between_distinct_users() {
    let f = fixture();
    let mut ticks = Vec::new();

    let generated = f
        .env
        .container
        .message_service()
        .generate(6, None, &mut |done, total| ticks.push((done, total)))
        .unwrap();

    assert_eq!(generated, 6);
    assert_eq!(ticks.last(), Some(&(6, 6)));
    let threads = f.env.store.threads().unwrap();
    assert_eq!(threads.len(), 6);
    for thread in threads {
        let messages = f.env.store.thread_messages(thread.id).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(thread.participants.len(), 2);
    }
}

#[test]
fn given_thread_when_generating_then_all_messages_in_thread() {
    let f = fixture();
    let first = send(&f, &f.alice, &f.bob, "seed", "2024-01-01 10:00:00");

    f.env
        .container
        .message_service()
        .generate(3, Some(first.thread_id), &mut |_, _| {})
        .unwrap();

    assert_eq!(f.env.store.threads().unwrap().len(), 1);
    assert_eq!(
        f.env.store.thread_messages(first.thread_id).unwrap().len(),
        4
    );
}

#[test]
fn given_single_user_when_generating_then_fails() {
    let env = TestEnv::new();
    env.store.insert_user("solo", "solo@example.com").unwrap();

    let err = env
        .container
        .message_service()
        .generate(2, None, &mut |_, _| {})
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "At least two users are needed to generate messages."
    );
}
