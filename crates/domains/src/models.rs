//! # Domain Models
//!
//! These structs represent the core entities of a rusty-chat session.
//! Identities and messages are immutable once created; the session
//! controller in `services` is the only thing that creates them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ValidationError;

/// Youngest age accepted at login.
pub const MIN_AGE: u8 = 18;
/// Oldest age accepted at login.
pub const MAX_AGE: u8 = 99;

/// Opaque identity token, unique per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(Uuid);

impl IdentityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for IdentityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The short form is what a user sees and types back in.
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for IdentityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Opaque message token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        };
        f.write_str(label)
    }
}

impl FromStr for Gender {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" | "o" => Ok(Gender::Other),
            other => Err(ValidationError::UnknownGender(other.to_string())),
        }
    }
}

/// The ephemeral record for either the local user or their partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub name: String,
    pub age: u8,
    pub gender: Gender,
}

/// Content classes a message can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Emoji,
    Photo,
    Link,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MessageKind::Text => "text",
            MessageKind::Emoji => "emoji",
            MessageKind::Photo => "photo",
            MessageKind::Link => "link",
        };
        f.write_str(label)
    }
}

/// Reference to uploaded media held by the presentation layer
/// (an object URL, a file path, a storage key...). Never inspected here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(String);

impl MediaRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One entry of the message log.
///
/// `media_ref` is present iff `kind` is [`MessageKind::Photo`]; use
/// [`Message::new`] so that invariant is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: IdentityId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub kind: MessageKind,
    pub media_ref: Option<MediaRef>,
}

impl Message {
    pub fn new(
        sender_id: IdentityId,
        content: impl Into<String>,
        kind: MessageKind,
        media_ref: Option<MediaRef>,
    ) -> Result<Self, ValidationError> {
        match (kind, &media_ref) {
            (MessageKind::Photo, None) => return Err(ValidationError::MissingMediaRef),
            (kind, Some(_)) if kind != MessageKind::Photo => {
                return Err(ValidationError::UnexpectedMediaRef(kind))
            }
            _ => {}
        }

        Ok(Self {
            id: MessageId::new(),
            sender_id,
            content: content.into(),
            timestamp: Utc::now(),
            kind,
            media_ref,
        })
    }

    /// Plain text authored by someone other than the local user.
    pub fn text(sender_id: IdentityId, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            sender_id,
            content: content.into(),
            timestamp: Utc::now(),
            kind: MessageKind::Text,
            media_ref: None,
        }
    }
}

/// Where the session controller currently sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    LoggedOut,
    Idle,
    Searching,
    Matched,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionPhase::LoggedOut => "logged out",
            SessionPhase::Idle => "idle",
            SessionPhase::Searching => "searching",
            SessionPhase::Matched => "matched",
        };
        f.write_str(label)
    }
}

/// Monotonic counter bumped on disconnect and logout. Scheduled work
/// remembers the epoch it was created in and is dropped once it moves on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epoch(u64);

impl Epoch {
    pub fn value(&self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Handle for one pending partner search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchTicket(u64);

impl SearchTicket {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Read-only, serializable view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub user: Option<Identity>,
    pub partner: Option<Identity>,
    pub messages: Vec<Message>,
    pub blocked: Vec<IdentityId>,
    pub epoch: Epoch,
}
