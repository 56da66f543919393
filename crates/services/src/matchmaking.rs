//! # Matchmaking Engine
//!
//! State machine over `idle -> searching -> matched`. A search is a single
//! delayed completion identified by a [`SearchTicket`]; only the ticket the
//! engine is currently waiting on may complete, so a cancelled or superseded
//! search can never produce a partner.

use domains::{
    Gender, Identity, IdentityId, Message, PreconditionViolation, RandomSource, SearchTicket,
};

use crate::scheduler::ScheduledTask;

/// Names a synthesized partner can be given.
pub const PARTNER_NAMES: [&str; 14] = [
    "Alex", "Jordan", "Taylor", "Morgan", "Casey", "Riley", "Avery", "Cameron", "Quinn", "Reese",
    "Blake", "Dakota", "Harper", "Emerson",
];

/// Synthesized partners are `PARTNER_MIN_AGE..PARTNER_MIN_AGE + PARTNER_AGE_SPAN`.
pub const PARTNER_MIN_AGE: u8 = 18;
pub const PARTNER_AGE_SPAN: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    Idle,
    Searching(SearchTicket),
    Matched,
}

/// Outcome of asking the engine to start searching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStart {
    /// A new search began; the caller must schedule its completion.
    Started(SearchTicket),
    /// A search was already pending; nothing changed.
    AlreadySearching(SearchTicket),
}

impl SearchStart {
    pub fn ticket(&self) -> SearchTicket {
        match self {
            SearchStart::Started(ticket) | SearchStart::AlreadySearching(ticket) => *ticket,
        }
    }
}

#[derive(Debug)]
pub struct MatchmakingEngine {
    state: MatchState,
    next_ticket: u64,
    pending: Option<ScheduledTask>,
}

impl Default for MatchmakingEngine {
    fn default() -> Self {
        Self {
            state: MatchState::Idle,
            next_ticket: 1,
            pending: None,
        }
    }
}

impl MatchmakingEngine {
    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn is_searching(&self) -> bool {
        matches!(self.state, MatchState::Searching(_))
    }

    pub fn begin(&mut self) -> Result<SearchStart, PreconditionViolation> {
        match self.state {
            MatchState::Idle => {
                let ticket = SearchTicket::new(self.next_ticket);
                self.next_ticket += 1;
                self.state = MatchState::Searching(ticket);
                Ok(SearchStart::Started(ticket))
            }
            MatchState::Searching(ticket) => Ok(SearchStart::AlreadySearching(ticket)),
            MatchState::Matched => Err(PreconditionViolation::AlreadyMatched),
        }
    }

    /// Remembers the timer for `ticket` so it can be aborted on cancel.
    /// A stale ticket's timer is aborted straight away.
    pub fn attach(&mut self, ticket: SearchTicket, task: ScheduledTask) {
        if self.state == MatchState::Searching(ticket) {
            self.pending = Some(task);
        } else {
            task.cancel();
        }
    }

    pub fn cancel(&mut self, ticket: SearchTicket) -> Result<(), PreconditionViolation> {
        if self.state != MatchState::Searching(ticket) {
            return Err(PreconditionViolation::NotSearching);
        }
        if let Some(task) = self.pending.take() {
            task.cancel();
        }
        self.state = MatchState::Idle;
        Ok(())
    }

    /// Completes the search for `ticket`, producing a partner for `user`.
    /// Returns `None` if `ticket` is no longer the pending search.
    pub fn complete(
        &mut self,
        ticket: SearchTicket,
        user: &Identity,
        rng: &mut dyn RandomSource,
    ) -> Option<Identity> {
        if self.state != MatchState::Searching(ticket) {
            return None;
        }
        // Called from inside the timer itself, so just let the handle go.
        self.pending = None;
        self.state = MatchState::Matched;
        Some(synthesize_partner(user, rng))
    }

    /// Back to idle from any state, aborting a pending search.
    pub fn reset(&mut self) {
        if let Some(task) = self.pending.take() {
            task.cancel();
        }
        self.state = MatchState::Idle;
    }
}

/// Draws a random partner whose id differs from `user`'s.
pub fn synthesize_partner(user: &Identity, rng: &mut dyn RandomSource) -> Identity {
    let name = PARTNER_NAMES[rng.index(PARTNER_NAMES.len()) % PARTNER_NAMES.len()];
    let age = PARTNER_MIN_AGE as u64
        + rng.between(0, PARTNER_AGE_SPAN as u64) % PARTNER_AGE_SPAN as u64;
    let gender = Gender::ALL[rng.index(Gender::ALL.len()) % Gender::ALL.len()];

    let mut id = IdentityId::new();
    while id == user.id {
        id = IdentityId::new();
    }

    Identity {
        id,
        name: name.to_string(),
        age: age as u8,
        gender,
    }
}

/// The introduction a new partner opens the chat with.
pub fn seed_message(partner: &Identity) -> Message {
    Message::text(
        partner.id,
        format!(
            "Hi there! I'm {}, {} years old. How are you?",
            partner.name, partner.age
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::StdRandom;
    use domains::{MockRandomSource, MessageKind};

    fn user() -> Identity {
        crate::identity::new_identity("Alex", 25, Gender::Other).unwrap()
    }

    #[test]
    fn test_begin_from_idle_issues_fresh_tickets() {
        let mut engine = MatchmakingEngine::default();
        let first = engine.begin().unwrap();
        assert!(matches!(first, SearchStart::Started(_)));
        engine.cancel(first.ticket()).unwrap();

        let second = engine.begin().unwrap();
        assert_ne!(first.ticket(), second.ticket());
    }

    #[test]
    fn test_begin_while_searching_returns_existing_ticket() {
        let mut engine = MatchmakingEngine::default();
        let ticket = engine.begin().unwrap().ticket();
        assert_eq!(engine.begin(), Ok(SearchStart::AlreadySearching(ticket)));
        assert_eq!(engine.state(), MatchState::Searching(ticket));
    }

    #[test]
    fn test_cancelled_ticket_cannot_complete() {
        let mut engine = MatchmakingEngine::default();
        let mut rng = StdRandom::seeded(1);
        let ticket = engine.begin().unwrap().ticket();
        engine.cancel(ticket).unwrap();

        assert!(engine.complete(ticket, &user(), &mut rng).is_none());
        assert_eq!(engine.state(), MatchState::Idle);
    }

    #[test]
    fn test_superseded_ticket_cannot_complete() {
        let mut engine = MatchmakingEngine::default();
        let mut rng = StdRandom::seeded(1);
        let old = engine.begin().unwrap().ticket();
        engine.cancel(old).unwrap();
        let current = engine.begin().unwrap().ticket();

        assert!(engine.complete(old, &user(), &mut rng).is_none());
        assert!(engine.complete(current, &user(), &mut rng).is_some());
        assert_eq!(engine.state(), MatchState::Matched);
    }

    #[test]
    fn test_cancel_requires_pending_search() {
        let mut engine = MatchmakingEngine::default();
        assert_eq!(
            engine.cancel(SearchTicket::new(9)),
            Err(PreconditionViolation::NotSearching)
        );
    }

    #[test]
    fn test_begin_while_matched_is_rejected() {
        let mut engine = MatchmakingEngine::default();
        let mut rng = StdRandom::seeded(3);
        let ticket = engine.begin().unwrap().ticket();
        engine.complete(ticket, &user(), &mut rng).unwrap();

        assert_eq!(engine.begin(), Err(PreconditionViolation::AlreadyMatched));
        engine.reset();
        assert_eq!(engine.state(), MatchState::Idle);
    }

    #[test]
    fn test_synthesize_partner_uses_draws() {
        let mut rng = MockRandomSource::new();
        let mut seq = mockall::Sequence::new();
        rng.expect_index()
            .with(mockall::predicate::eq(PARTNER_NAMES.len()))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(13usize);
        rng.expect_between()
            .with(mockall::predicate::eq(0), mockall::predicate::eq(30))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(29u64);
        rng.expect_index()
            .with(mockall::predicate::eq(3))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(1usize);

        let me = user();
        let partner = synthesize_partner(&me, &mut rng);
        assert_eq!(partner.name, "Emerson");
        assert_eq!(partner.age, 47);
        assert_eq!(partner.gender, Gender::Female);
        assert_ne!(partner.id, me.id);
    }

    #[test]
    fn test_partner_age_stays_in_range() {
        let mut rng = StdRandom::seeded(99);
        let me = user();
        for _ in 0..500 {
            let partner = synthesize_partner(&me, &mut rng);
            assert!((18..=47).contains(&partner.age));
        }
    }

    #[test]
    fn test_seed_message_introduces_partner() {
        let partner = synthesize_partner(&user(), &mut StdRandom::seeded(5));
        let seed = seed_message(&partner);
        assert_eq!(seed.sender_id, partner.id);
        assert_eq!(seed.kind, MessageKind::Text);
        assert_eq!(
            seed.content,
            format!("Hi there! I'm {}, {} years old. How are you?", partner.name, partner.age)
        );
    }
}
