//! Fixtures shared by the scenario tests under `tests/`.

use std::time::Duration;

use domains::{MockRandomSource, RandomSource};
use services::{ChatSession, Scheduler, SessionSettings, StdRandom};

/// Longer than any delay the default settings can draw.
pub const SETTLE: Duration = Duration::from_secs(5);

/// Session on the current (paused) test runtime with a seeded rng.
pub fn seeded_session(reply_probability: f64) -> ChatSession {
    session_with(
        Box::new(StdRandom::seeded(2024)),
        SessionSettings {
            reply_probability,
            ..SessionSettings::default()
        },
    )
}

pub fn session_with(rng: Box<dyn RandomSource>, settings: SessionSettings) -> ChatSession {
    ChatSession::new(settings, rng, Scheduler::current())
}

/// Rng that always picks the last list entry, the shortest delay, and
/// answers whenever the reply probability is above one half.
pub fn predictable_rng() -> MockRandomSource {
    let mut rng = MockRandomSource::new();
    rng.expect_index().returning(|len| len - 1);
    rng.expect_between().returning(|low, _| low);
    rng.expect_chance().returning(|probability| probability > 0.5);
    rng
}

/// Lets every timer the default settings can schedule fire.
pub async fn settle() {
    tokio::time::sleep(SETTLE).await;
}
