//! # Messaging Engine
//!
//! Classifies outbound content and plans the partner's simulated answers.
//! Reply timers are tracked here so a disconnect can abort them; the
//! session epoch remains the authority on whether a reply may still land.

use std::time::Duration;

use domains::{IdentityId, Message, MessageKind, RandomSource};

use crate::scheduler::ScheduledTask;
use crate::settings::SessionSettings;

/// What the simulated partner can say back.
pub const CANNED_REPLIES: [&str; 10] = [
    "That's interesting!",
    "Tell me more.",
    "I see what you mean.",
    "Haha, that's funny 😂",
    "I'm not sure I understand...",
    "Cool! 👍",
    "What else do you enjoy?",
    "I've never thought about it that way.",
    "Oh really?",
    "So what do you think about that?",
];

/// Palette offered by emoji pickers.
pub const EMOJI_PALETTE: [&str; 30] = [
    "😊", "😂", "❤️", "👍", "😍", "😒", "🙌", "👏", "😘", "🤔", "😭", "😎", "👋", "🎉", "🔥",
    "💯", "✨", "🙏", "👌", "😁", "👀", "💕", "🤷‍♂️", "🤷‍♀️", "🙄", "😅", "😩", "🤦‍♂️",
    "🤦‍♀️", "😤",
];

/// `Link` if `text` contains `marker`, otherwise `Text`.
/// Photos never come through here.
pub fn classify(text: &str, marker: &str) -> MessageKind {
    if !marker.is_empty() && text.contains(marker) {
        MessageKind::Link
    } else {
        MessageKind::Text
    }
}

pub fn palette_emoji(index: usize) -> Option<&'static str> {
    EMOJI_PALETTE.get(index).copied()
}

/// A canned answer authored by `partner`.
pub fn canned_reply(partner: IdentityId, rng: &mut dyn RandomSource) -> Message {
    let content = CANNED_REPLIES[rng.index(CANNED_REPLIES.len()) % CANNED_REPLIES.len()];
    Message::text(partner, content)
}

#[derive(Debug, Default)]
pub struct MessagingEngine {
    pending_replies: Vec<ScheduledTask>,
}

impl MessagingEngine {
    /// Decides whether the partner answers, and after how long.
    pub fn plan_reply(
        &self,
        rng: &mut dyn RandomSource,
        settings: &SessionSettings,
    ) -> Option<Duration> {
        if !rng.chance(settings.reply_probability) {
            return None;
        }
        Some(settings.reply_delay.draw(rng))
    }

    pub fn track(&mut self, task: ScheduledTask) {
        self.pending_replies.retain(|task| !task.is_finished());
        self.pending_replies.push(task);
    }

    pub fn cancel_all(&mut self) {
        for task in self.pending_replies.drain(..) {
            task.cancel();
        }
    }

    pub fn pending(&self) -> usize {
        self.pending_replies
            .iter()
            .filter(|task| !task.is_finished())
            .count()
    }
}
