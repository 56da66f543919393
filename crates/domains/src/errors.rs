//! # DomainError
//!
//! Centralized error handling for rusty-chat.
//! Nothing here is fatal: validation errors are surfaced to the caller,
//! precondition violations report an operation that was ignored.

use thiserror::Error;

use crate::models::MessageKind;

/// Input rejected before any state changed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("age {0} is outside 18-99")]
    AgeOutOfRange(u32),

    #[error("unknown gender `{0}` (expected male, female or other)")]
    UnknownGender(String),

    #[error("message must not be empty")]
    EmptyMessage,

    #[error("photo messages need a media reference")]
    MissingMediaRef,

    #[error("{0} messages cannot carry a media reference")]
    UnexpectedMediaRef(MessageKind),

    #[error("no emoji at palette index {0}")]
    UnknownEmoji(usize),
}

/// An operation that is not valid in the current session state.
/// State is left untouched when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionViolation {
    #[error("no user is logged in")]
    NotLoggedIn,

    #[error("no partner is connected")]
    NoPartner,

    #[error("already chatting with a partner")]
    AlreadyMatched,

    #[error("no search is pending")]
    NotSearching,

    #[error("only the current partner can be blocked")]
    NotCurrentPartner,
}

/// The primary error type for all session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("precondition violated: {0}")]
    Precondition(#[from] PreconditionViolation),
}

impl DomainError {
    /// True when the call was a no-op because of session state, as opposed
    /// to rejected input.
    pub fn is_precondition(&self) -> bool {
        matches!(self, DomainError::Precondition(_))
    }
}

/// A specialized Result type for rusty-chat logic.
pub type Result<T> = std::result::Result<T, DomainError>;
