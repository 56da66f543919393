//! Sending, classification and simulated partner replies.

use std::time::Duration;

use domains::{
    DomainError, Gender, MediaRef, MessageKind, PreconditionViolation, ValidationError,
};
use integration_tests::{predictable_rng, seeded_session, session_with, settle};
use services::{ChatSession, SessionSettings};
use tokio_test::{assert_err, assert_ok};

async fn matched(session: &ChatSession) {
    assert_ok!(session.login("Alex", 25, Gender::Other));
    assert_ok!(session.start_search());
    settle().await;
    assert!(session.partner().is_some(), "search should have completed");
}

#[tokio::test(start_paused = true)]
async fn test_send_without_partner_leaves_log_unchanged() {
    let session = seeded_session(1.0);
    assert_ok!(session.login("Alex", 25, Gender::Other));
    assert_eq!(session.messages().len(), 0);

    let err = assert_err!(session.send("hello", MessageKind::Text, None));
    assert_eq!(err, DomainError::Precondition(PreconditionViolation::NoPartner));
    assert_eq!(session.messages().len(), 0);

    settle().await;
    assert_eq!(session.messages().len(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_send_while_logged_out_is_reported() {
    let session = seeded_session(1.0);
    let err = assert_err!(session.send_text("hello"));
    assert_eq!(err, DomainError::Precondition(PreconditionViolation::NotLoggedIn));
}

#[tokio::test(start_paused = true)]
async fn test_platform_link_is_classified_as_link() {
    let session = seeded_session(0.0);
    matched(&session).await;

    let link = assert_ok!(session.send_text("t.me/demo"));
    assert_eq!(link.kind, MessageKind::Link);
    assert_eq!(session.messages().last().map(|m| m.kind), Some(MessageKind::Link));

    let text = assert_ok!(session.send_text("demo"));
    assert_eq!(text.kind, MessageKind::Text);
}

#[tokio::test(start_paused = true)]
async fn test_sent_message_is_authored_by_user() {
    let session = seeded_session(0.0);
    matched(&session).await;

    let message = assert_ok!(session.send_text("  hello  "));
    assert_eq!(message.content, "hello");
    assert_eq!(Some(message.sender_id), session.user().map(|u| u.id));
    assert_eq!(session.messages().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_blank_text_is_rejected() {
    let session = seeded_session(0.0);
    matched(&session).await;

    let err = assert_err!(session.send_text("   "));
    assert_eq!(err, DomainError::Validation(ValidationError::EmptyMessage));
    assert_eq!(session.messages().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_photo_carries_media_reference() {
    let session = seeded_session(0.0);
    matched(&session).await;

    let photo = assert_ok!(session.send_photo("beach.png", MediaRef::new("blob:beach")));
    assert_eq!(photo.kind, MessageKind::Photo);
    assert_eq!(photo.content, "beach.png");
    assert_eq!(photo.media_ref, Some(MediaRef::new("blob:beach")));

    let err = assert_err!(session.send("beach.png", MessageKind::Photo, None));
    assert_eq!(err, DomainError::Validation(ValidationError::MissingMediaRef));
}

#[tokio::test(start_paused = true)]
async fn test_emoji_paths() {
    let session = seeded_session(0.0);
    matched(&session).await;

    let picked = assert_ok!(session.send_palette_emoji(14));
    assert_eq!(picked.kind, MessageKind::Emoji);
    assert_eq!(picked.content, "🔥");

    let typed = assert_ok!(session.send_emoji("🦀"));
    assert_eq!(typed.kind, MessageKind::Emoji);

    let err = assert_err!(session.send_palette_emoji(99));
    assert_eq!(err, DomainError::Validation(ValidationError::UnknownEmoji(99)));
}

#[tokio::test(start_paused = true)]
async fn test_reply_arrives_after_delay_from_partner() {
    let session = session_with(Box::new(predictable_rng()), SessionSettings::default());
    matched(&session).await;
    let partner = session.partner().unwrap();

    assert_ok!(session.send_text("how are you?"));
    assert_eq!(session.pending_replies(), 1);

    tokio::time::sleep(Duration::from_millis(999)).await;
    assert_eq!(session.messages().len(), 2);

    tokio::time::sleep(Duration::from_millis(2)).await;
    let messages = session.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2].sender_id, partner.id);
    assert_eq!(messages[2].content, "So what do you think about that?");
    assert_eq!(messages[2].kind, MessageKind::Text);
}

#[tokio::test(start_paused = true)]
async fn test_no_reply_when_partner_stays_quiet() {
    let settings = SessionSettings {
        reply_probability: 0.3,
        ..SessionSettings::default()
    };
    // predictable_rng answers only above one half.
    let session = session_with(Box::new(predictable_rng()), settings);
    matched(&session).await;

    assert_ok!(session.send_text("anyone there?"));
    assert_eq!(session.pending_replies(), 0);
    settle().await;
    assert_eq!(session.messages().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_reply_interleaves_in_completion_order() {
    let session = session_with(Box::new(predictable_rng()), SessionSettings::default());
    matched(&session).await;

    assert_ok!(session.send_text("first"));
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_ok!(session.send_text("second"));
    tokio::time::sleep(Duration::from_millis(1_500)).await;

    let contents: Vec<_> = session
        .messages()
        .into_iter()
        .skip(1)
        .map(|m| m.content)
        .collect();
    assert_eq!(
        contents,
        [
            "first",
            "So what do you think about that?",
            "second",
            "So what do you think about that?",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_reply_pending_at_disconnect_is_dropped() {
    // Scheduled before the disconnect, so the epoch bump invalidates it.
    let session = seeded_session(1.0);
    matched(&session).await;

    assert_ok!(session.send_text("bye"));
    assert_ok!(session.disconnect());
    settle().await;

    assert!(session.messages().is_empty());
    assert!(session.partner().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_reply_pending_at_rematch_never_reaches_new_chat() {
    let session = seeded_session(1.0);
    matched(&session).await;

    assert_ok!(session.send_text("bye"));
    assert_ok!(session.disconnect());
    assert_ok!(session.start_search());
    settle().await;

    let partner = session.partner().expect("rematched");
    let messages = session.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sender_id, partner.id);
}
