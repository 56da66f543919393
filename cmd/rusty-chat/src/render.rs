//! Turns session events into terminal lines.

use chrono::Local;
use domains::{Identity, Message, MessageKind, SessionEvent};

/// What the terminal prints for `event`.
pub fn event_line(event: &SessionEvent, user: Option<&Identity>, partner: Option<&Identity>) -> String {
    match event {
        SessionEvent::LoggedIn { user } => format!("* Welcome, {}!", user.name),
        SessionEvent::LoggedOut => "* You have been logged out.".to_string(),
        SessionEvent::SearchStarted { .. } => "* Looking for someone to chat with...".to_string(),
        SessionEvent::SearchCancelled { .. } => "* Search cancelled.".to_string(),
        SessionEvent::PartnerFound { partner } => format!(
            "* Connected with {} ({}, {}). Say hi!",
            partner.name, partner.age, partner.gender
        ),
        SessionEvent::MessageAppended { message } => message_line(message, user, partner),
        SessionEvent::Disconnected { .. } => "* Chat disconnected.".to_string(),
        SessionEvent::Blocked { .. } => "* User has been blocked.".to_string(),
        SessionEvent::Unblocked { .. } => "* User has been unblocked.".to_string(),
    }
}

pub fn message_line(message: &Message, user: Option<&Identity>, partner: Option<&Identity>) -> String {
    let time = message.timestamp.with_timezone(&Local).format("%-I:%M %p");
    let author = if user.is_some_and(|user| user.id == message.sender_id) {
        "you".to_string()
    } else {
        partner
            .filter(|partner| partner.id == message.sender_id)
            .map(|partner| partner.name.clone())
            .unwrap_or_else(|| "stranger".to_string())
    };

    let body = match (message.kind, &message.media_ref) {
        (MessageKind::Photo, Some(media)) => format!("[photo {}] {}", message.content, media.as_str()),
        (MessageKind::Link, _) => format!("<{}>", message.content),
        _ => message.content.clone(),
    };
    format!("[{time}] {author}: {body}")
}
