//! # Session Events
//!
//! Presentation-neutral notifications of every observable transition.
//! A front end turns these into toasts, status lines, or nothing at all.

use serde::{Deserialize, Serialize};

use crate::models::{Identity, IdentityId, Message, SearchTicket};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    LoggedIn { user: Identity },
    LoggedOut,
    SearchStarted { ticket: SearchTicket },
    SearchCancelled { ticket: SearchTicket },
    PartnerFound { partner: Identity },
    MessageAppended { message: Message },
    Disconnected { partner_id: IdentityId },
    Blocked { id: IdentityId },
    Unblocked { id: IdentityId },
}
