//! # Core Traits (Ports)
//!
//! Seams the session core reaches through instead of touching the
//! outside world directly. Tests swap these for deterministic fakes.

/// Source of the random draws used by matchmaking and auto-replies.
///
/// Every draw is uniform. Implementations must stay within the bounds
/// they are given; callers index fixed lists with the results.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait RandomSource: Send {
    /// Returns an index in `0..len`. `len` is never zero.
    fn index(&mut self, len: usize) -> usize;

    /// Returns a value in `low..high`. `low < high` always holds.
    fn between(&mut self, low: u64, high: u64) -> u64;

    /// Returns `true` with the given probability in `[0, 1]`.
    fn chance(&mut self, probability: f64) -> bool;
}
