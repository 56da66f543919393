//! # services
//!
//! The rusty-chat session core: identity, message log, moderation,
//! matchmaking and messaging, orchestrated by [`ChatSession`].
//!
//! Everything that happens later (a partner turning up, a partner
//! answering) is scheduled on the Tokio runtime and re-validated against
//! the session epoch when it fires.

pub mod identity;
pub mod matchmaking;
pub mod message_log;
pub mod messaging;
pub mod moderation;
pub mod random;
pub mod scheduler;
pub mod session;
pub mod settings;

pub use random::StdRandom;
pub use scheduler::{ScheduledTask, Scheduler};
pub use session::ChatSession;
pub use settings::{DelayRange, SessionSettings};
