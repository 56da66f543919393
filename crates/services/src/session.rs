//! # Session Controller
//!
//! [`ChatSession`] is the single entry point to a chat session. It owns the
//! identity, partner, message log, moderation store and both engines behind
//! one lock, so every transition (caller-driven or timer-driven) happens on
//! one logical timeline.
//!
//! Timer jobs hold only a weak reference to the session and carry the epoch
//! they were scheduled in. Disconnect and logout bump the epoch, so a job
//! that wakes up afterwards finds itself stale and does nothing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::broadcast;
use tracing::{debug, info};

use domains::{
    Epoch, Gender, Identity, IdentityId, MediaRef, Message, MessageKind,
    PreconditionViolation, RandomSource, Result, SearchTicket, SessionEvent, SessionPhase,
    SessionSnapshot, ValidationError,
};

use crate::identity::{self, IdentityManager};
use crate::matchmaking::{self, MatchmakingEngine, SearchStart};
use crate::message_log::MessageLog;
use crate::messaging::{self, MessagingEngine};
use crate::moderation::ModerationStore;
use crate::scheduler::Scheduler;
use crate::settings::SessionSettings;

/// Cloneable handle to one chat session. All clones share the same state.
#[derive(Clone)]
pub struct ChatSession {
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<SessionState>,
    settings: SessionSettings,
    scheduler: Scheduler,
    events: broadcast::Sender<SessionEvent>,
}

struct SessionState {
    identity: IdentityManager,
    partner: Option<Identity>,
    log: MessageLog,
    moderation: ModerationStore,
    matchmaking: MatchmakingEngine,
    messaging: MessagingEngine,
    epoch: Epoch,
    rng: Box<dyn RandomSource>,
}

impl ChatSession {
    pub fn new(settings: SessionSettings, rng: Box<dyn RandomSource>, scheduler: Scheduler) -> Self {
        let (events, _) = broadcast::channel(settings.event_capacity.max(1));
        let state = SessionState {
            identity: IdentityManager::default(),
            partner: None,
            log: MessageLog::default(),
            moderation: ModerationStore::default(),
            matchmaking: MatchmakingEngine::default(),
            messaging: MessagingEngine::default(),
            epoch: Epoch::default(),
            rng,
        };

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                settings,
                scheduler,
                events,
            }),
        }
    }

    /// Receives every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.shared.settings
    }

    // ── Identity ────────────────────────────────────────────────────────────

    /// Creates the local identity. An existing login is logged out first,
    /// but only once the new fields have passed validation.
    pub fn login(&self, name: &str, age: u32, gender: Gender) -> Result<Identity> {
        let user = identity::new_identity(name, age, gender)?;

        let mut state = self.shared.lock();
        if state.identity.current().is_some() {
            self.shared.logout_locked(&mut state);
        }
        state.identity.replace(user.clone());

        info!(user_id = %user.id, name = %user.name, "logged in");
        self.shared.publish(SessionEvent::LoggedIn { user: user.clone() });
        Ok(user)
    }

    /// Disconnects, cancels every pending job, forgets the local identity
    /// and clears the moderation store. Does nothing when logged out.
    pub fn logout(&self) {
        let mut state = self.shared.lock();
        if state.identity.current().is_none() {
            debug!("logout ignored: not logged in");
            return;
        }
        self.shared.logout_locked(&mut state);
    }

    // ── Matchmaking ─────────────────────────────────────────────────────────

    /// Starts looking for a partner. Calling this while a search is pending
    /// returns the pending search's ticket and changes nothing.
    pub fn start_search(&self) -> Result<SearchTicket> {
        let mut state = self.shared.lock();
        let state = &mut *state;
        if state.identity.current().is_none() {
            return Err(PreconditionViolation::NotLoggedIn.into());
        }
        if state.partner.is_some() {
            return Err(PreconditionViolation::AlreadyMatched.into());
        }

        let ticket = match state.matchmaking.begin()? {
            SearchStart::AlreadySearching(ticket) => {
                debug!(ticket = ticket.value(), "search already pending");
                return Ok(ticket);
            }
            SearchStart::Started(ticket) => ticket,
        };

        state.log.clear();
        let delay = self.shared.settings.match_delay.draw(state.rng.as_mut());
        let epoch = state.epoch;
        let weak = Arc::downgrade(&self.shared);
        let task = self.shared.scheduler.schedule(delay, move || {
            Shared::on_match_timer(weak, ticket, epoch);
        });
        state.matchmaking.attach(ticket, task);

        info!(ticket = ticket.value(), delay_ms = delay.as_millis() as u64, "search started");
        self.shared.publish(SessionEvent::SearchStarted { ticket });
        Ok(ticket)
    }

    /// Cancels the pending search before it can produce a partner.
    pub fn stop_search(&self) -> Result<()> {
        let mut state = self.shared.lock();
        let ticket = match state.matchmaking.state() {
            matchmaking::MatchState::Searching(ticket) => ticket,
            _ => return Err(PreconditionViolation::NotSearching.into()),
        };
        state.matchmaking.cancel(ticket)?;

        info!(ticket = ticket.value(), "search cancelled");
        self.shared.publish(SessionEvent::SearchCancelled { ticket });
        Ok(())
    }

    // ── Messaging ───────────────────────────────────────────────────────────

    /// Appends a message from the local user to the log and maybe schedules
    /// the partner's answer. `media_ref` must be present iff `kind` is photo.
    pub fn send(
        &self,
        content: &str,
        kind: MessageKind,
        media_ref: Option<MediaRef>,
    ) -> Result<Message> {
        let mut state = self.shared.lock();
        let state = &mut *state;
        let user_id = state
            .identity
            .current()
            .map(|user| user.id)
            .ok_or(PreconditionViolation::NotLoggedIn)?;
        let partner_id = state
            .partner
            .as_ref()
            .map(|partner| partner.id)
            .ok_or(PreconditionViolation::NoPartner)?;

        let message = Message::new(user_id, content, kind, media_ref)?;
        state.log.append(message.clone());
        debug!(message_id = %message.id, kind = %message.kind, "message sent");
        self.shared.publish(SessionEvent::MessageAppended {
            message: message.clone(),
        });

        if let Some(delay) = state
            .messaging
            .plan_reply(state.rng.as_mut(), &self.shared.settings)
        {
            let epoch = state.epoch;
            let weak = Arc::downgrade(&self.shared);
            let task = self.shared.scheduler.schedule(delay, move || {
                Shared::on_reply_timer(weak, partner_id, epoch);
            });
            state.messaging.track(task);
            debug!(delay_ms = delay.as_millis() as u64, "partner reply scheduled");
        }

        Ok(message)
    }

    /// Sends typed text, classifying it as `link` or `text`.
    pub fn send_text(&self, content: &str) -> Result<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }
        let kind = messaging::classify(content, &self.shared.settings.link_marker);
        self.send(content, kind, None)
    }

    pub fn send_emoji(&self, emoji: &str) -> Result<Message> {
        let emoji = emoji.trim();
        if emoji.is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }
        self.send(emoji, MessageKind::Emoji, None)
    }

    /// Sends the emoji at `index` of [`messaging::EMOJI_PALETTE`].
    pub fn send_palette_emoji(&self, index: usize) -> Result<Message> {
        let emoji = messaging::palette_emoji(index).ok_or(ValidationError::UnknownEmoji(index))?;
        self.send(emoji, MessageKind::Emoji, None)
    }

    /// The upload path: a photo is its file name plus an opaque media reference.
    pub fn send_photo(&self, file_name: &str, media_ref: MediaRef) -> Result<Message> {
        self.send(file_name, MessageKind::Photo, Some(media_ref))
    }

    // ── Moderation ──────────────────────────────────────────────────────────

    /// Blocks the current partner and disconnects from them.
    pub fn block(&self, partner_id: IdentityId) -> Result<()> {
        let mut state = self.shared.lock();
        match &state.partner {
            None => return Err(PreconditionViolation::NoPartner.into()),
            Some(partner) if partner.id != partner_id => {
                return Err(PreconditionViolation::NotCurrentPartner.into())
            }
            Some(_) => {}
        }

        state.moderation.block(partner_id);
        info!(partner_id = %partner_id, "partner blocked");
        self.shared.publish(SessionEvent::Blocked { id: partner_id });
        self.shared.disconnect_locked(&mut state);
        Ok(())
    }

    /// Removes `id` from the blocked set. Returns whether it was there.
    pub fn unblock(&self, id: IdentityId) -> bool {
        let mut state = self.shared.lock();
        let removed = state.moderation.unblock(&id);
        if removed {
            info!(id = %id, "unblocked");
            self.shared.publish(SessionEvent::Unblocked { id });
        }
        removed
    }

    pub fn is_blocked(&self, id: &IdentityId) -> bool {
        self.shared.lock().moderation.is_blocked(id)
    }

    /// Blocked ids in the order they were blocked.
    pub fn blocked(&self) -> Vec<IdentityId> {
        self.shared.lock().moderation.blocked().to_vec()
    }

    // ── Chat ────────────────────────────────────────────────────────────────

    /// Leaves the current chat: partner and log are cleared, pending replies
    /// are invalidated. The blocked set is untouched.
    pub fn disconnect(&self) -> Result<()> {
        let mut state = self.shared.lock();
        if state.partner.is_none() {
            return Err(PreconditionViolation::NoPartner.into());
        }
        self.shared.disconnect_locked(&mut state);
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    pub fn phase(&self) -> SessionPhase {
        self.shared.lock().phase()
    }

    pub fn user(&self) -> Option<Identity> {
        self.shared.lock().identity.current().cloned()
    }

    pub fn partner(&self) -> Option<Identity> {
        self.shared.lock().partner.clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.shared.lock().log.to_vec()
    }

    pub fn is_searching(&self) -> bool {
        self.shared.lock().matchmaking.is_searching()
    }

    pub fn epoch(&self) -> Epoch {
        self.shared.lock().epoch
    }

    /// Reply timers that have not fired yet.
    pub fn pending_replies(&self) -> usize {
        self.shared.lock().messaging.pending()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.shared.lock();
        SessionSnapshot {
            phase: state.phase(),
            user: state.identity.current().cloned(),
            partner: state.partner.clone(),
            messages: state.log.to_vec(),
            blocked: state.moderation.blocked().to_vec(),
            epoch: state.epoch,
        }
    }

    /// The outbound deep link to the external messaging platform.
    pub fn platform_link(&self) -> &str {
        &self.shared.settings.platform_link
    }

    /// Whether a renderer should turn `content` into a platform hyperlink.
    pub fn is_platform_link(&self, content: &str) -> bool {
        messaging::classify(content, &self.shared.settings.link_marker) == MessageKind::Link
    }
}

impl SessionState {
    fn phase(&self) -> SessionPhase {
        if self.identity.current().is_none() {
            SessionPhase::LoggedOut
        } else if self.matchmaking.is_searching() {
            SessionPhase::Searching
        } else if self.partner.is_some() {
            SessionPhase::Matched
        } else {
            SessionPhase::Idle
        }
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // Every transition is applied in full before the guard drops, so a
        // poisoned lock still holds consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn disconnect_locked(&self, state: &mut SessionState) {
        state.messaging.cancel_all();
        state.matchmaking.reset();
        state.log.clear();
        state.epoch = state.epoch.next();

        if let Some(partner) = state.partner.take() {
            info!(partner_id = %partner.id, epoch = state.epoch.value(), "disconnected");
            self.publish(SessionEvent::Disconnected {
                partner_id: partner.id,
            });
        }
    }

    fn logout_locked(&self, state: &mut SessionState) {
        if state.matchmaking.is_searching() {
            debug!("pending search dropped by logout");
        }
        self.disconnect_locked(state);
        state.moderation.clear();
        if let Some(user) = state.identity.logout() {
            info!(user_id = %user.id, "logged out");
            self.publish(SessionEvent::LoggedOut);
        }
    }

    fn on_match_timer(weak: Weak<Shared>, ticket: SearchTicket, epoch: Epoch) {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let mut state = shared.lock();
        let state = &mut *state;
        if state.epoch != epoch {
            debug!(ticket = ticket.value(), "stale search timer ignored");
            return;
        }
        let Some(user) = state.identity.current() else {
            return;
        };
        let Some(partner) = state
            .matchmaking
            .complete(ticket, user, state.rng.as_mut())
        else {
            debug!(ticket = ticket.value(), "cancelled search timer ignored");
            return;
        };

        let seed = matchmaking::seed_message(&partner);
        state.log.clear();
        state.log.append(seed.clone());
        state.partner = Some(partner.clone());

        info!(partner_id = %partner.id, name = %partner.name, "partner found");
        shared.publish(SessionEvent::PartnerFound { partner });
        shared.publish(SessionEvent::MessageAppended { message: seed });
    }

    fn on_reply_timer(weak: Weak<Shared>, partner_id: IdentityId, epoch: Epoch) {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let mut state = shared.lock();
        let state = &mut *state;
        let still_chatting = state
            .partner
            .as_ref()
            .is_some_and(|partner| partner.id == partner_id);
        if state.epoch != epoch || !still_chatting {
            debug!(partner_id = %partner_id, "stale reply dropped");
            return;
        }

        let reply = messaging::canned_reply(partner_id, state.rng.as_mut());
        state.log.append(reply.clone());
        debug!(message_id = %reply.id, "partner replied");
        shared.publish(SessionEvent::MessageAppended { message: reply });
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("ChatSession")
            .field("phase", &state.phase())
            .field("epoch", &state.epoch)
            .field("messages", &state.log.len())
            .finish()
    }
}
