//! Moderation Store: who the local user has blocked.
//!
//! Scoped to one local identity; the controller clears it on logout.
//! Matchmaking does not consult it.

use domains::IdentityId;

#[derive(Debug, Default)]
pub struct ModerationStore {
    // Kept in block order so a "blocked users" list reads chronologically.
    blocked: Vec<IdentityId>,
}

impl ModerationStore {
    /// Returns `false` if the id was already blocked.
    pub fn block(&mut self, id: IdentityId) -> bool {
        if self.is_blocked(&id) {
            return false;
        }
        self.blocked.push(id);
        true
    }

    /// Removes `id` whether or not it was present. Returns whether it was.
    pub fn unblock(&mut self, id: &IdentityId) -> bool {
        let before = self.blocked.len();
        self.blocked.retain(|blocked| blocked != id);
        self.blocked.len() != before
    }

    pub fn is_blocked(&self, id: &IdentityId) -> bool {
        self.blocked.contains(id)
    }

    pub fn blocked(&self) -> &[IdentityId] {
        &self.blocked
    }

    pub fn clear(&mut self) {
        self.blocked.clear();
    }
}
