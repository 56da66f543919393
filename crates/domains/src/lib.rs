//! # domains
//!
//! Data model, error taxonomy, events and port traits for rusty-chat.
//! Pure types only: no I/O, no runtime.

pub mod errors;
pub mod events;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use events::*;
pub use models::*;
pub use ports::*;
