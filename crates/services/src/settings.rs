//! Tunables for one chat session. The binary fills these from `configs`;
//! tests build them directly.

use std::time::Duration;

use domains::RandomSource;

/// Half-open delay range `[min, max)`, drawn uniformly at millisecond grain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub const fn from_millis(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_millis(min),
            max: Duration::from_millis(max),
        }
    }

    /// Always yields `min` when the range is empty.
    pub fn draw(&self, rng: &mut dyn RandomSource) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        if max <= min {
            return self.min;
        }
        Duration::from_millis(rng.between(min, max))
    }
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// How long a partner search takes.
    pub match_delay: DelayRange,
    /// How long the partner takes to answer.
    pub reply_delay: DelayRange,
    /// Chance that a sent message gets an answer at all.
    pub reply_probability: f64,
    /// Outbound deep link to the external messaging platform. Opaque.
    pub platform_link: String,
    /// Substring that makes a text message a `link`.
    pub link_marker: String,
    /// Buffer size of the event channel; slow subscribers lose the oldest.
    pub event_capacity: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            match_delay: DelayRange::from_millis(1_000, 4_000),
            reply_delay: DelayRange::from_millis(1_000, 4_000),
            reply_probability: 0.7,
            platform_link: "https://t.me/rusty_chat_bot".to_string(),
            link_marker: "t.me/".to_string(),
            event_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::MockRandomSource;
    use mockall::predicate::eq;

    #[test]
    fn test_draw_uses_millisecond_bounds() {
        let mut rng = MockRandomSource::new();
        rng.expect_between()
            .with(eq(1_000), eq(4_000))
            .times(1)
            .return_const(2_500u64);

        let delay = DelayRange::from_millis(1_000, 4_000).draw(&mut rng);
        assert_eq!(delay, Duration::from_millis(2_500));
    }

    #[test]
    fn test_empty_range_skips_rng() {
        let mut rng = MockRandomSource::new();
        rng.expect_between().never();
        let delay = DelayRange::from_millis(300, 300).draw(&mut rng);
        assert_eq!(delay, Duration::from_millis(300));
    }
}
