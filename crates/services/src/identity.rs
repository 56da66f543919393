//! Identity Manager: owns the local user's throwaway identity.

use domains::{Gender, Identity, IdentityId, ValidationError, MAX_AGE, MIN_AGE};

/// Checks login fields and builds a fresh identity from them.
///
/// The name is trimmed before it is stored. Nothing is corrected silently:
/// out-of-range ages and blank names are rejected.
pub fn new_identity(name: &str, age: u32, gender: Gender) -> Result<Identity, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    let age = u8::try_from(age)
        .ok()
        .filter(|age| (MIN_AGE..=MAX_AGE).contains(age))
        .ok_or(ValidationError::AgeOutOfRange(age))?;

    Ok(Identity {
        id: IdentityId::new(),
        name: name.to_string(),
        age,
        gender,
    })
}

#[derive(Debug, Default)]
pub struct IdentityManager {
    current: Option<Identity>,
}

impl IdentityManager {
    pub fn current(&self) -> Option<&Identity> {
        self.current.as_ref()
    }

    /// Installs a validated identity, returning the one it replaced.
    /// Moderation state is the caller's concern.
    pub fn replace(&mut self, identity: Identity) -> Option<Identity> {
        self.current.replace(identity)
    }

    /// Discards the local identity. Returns what was discarded, if anything.
    pub fn logout(&mut self) -> Option<Identity> {
        self.current.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_identity_accepts_age_bounds() {
        assert_eq!(new_identity("Alex", 18, Gender::Other).unwrap().age, 18);
        assert_eq!(new_identity("Alex", 99, Gender::Other).unwrap().age, 99);
    }

    #[test]
    fn test_new_identity_rejects_out_of_range_age() {
        for age in [0, 17, 100, 300] {
            assert_eq!(
                new_identity("Alex", age, Gender::Male),
                Err(ValidationError::AgeOutOfRange(age))
            );
        }
    }

    #[test]
    fn test_new_identity_rejects_blank_name() {
        assert_eq!(new_identity("   ", 30, Gender::Female), Err(ValidationError::EmptyName));
        assert_eq!(new_identity("", 30, Gender::Female), Err(ValidationError::EmptyName));
    }

    #[test]
    fn test_new_identity_trims_name_and_ids_are_fresh() {
        let first = new_identity("  Sam ", 30, Gender::Female).unwrap();
        let second = new_identity("Sam", 30, Gender::Female).unwrap();
        assert_eq!(first.name, "Sam");
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_replace_returns_previous_identity() {
        let mut manager = IdentityManager::default();
        let first = new_identity("Sam", 30, Gender::Female).unwrap();
        let second = new_identity("Robin", 40, Gender::Male).unwrap();

        assert!(manager.replace(first.clone()).is_none());
        assert_eq!(manager.replace(second.clone()), Some(first));
        assert_eq!(manager.current(), Some(&second));
    }

    #[test]
    fn test_logout_is_idempotent() {
        let mut manager = IdentityManager::default();
        manager.replace(new_identity("Alex", 25, Gender::Other).unwrap());
        assert!(manager.logout().is_some());
        assert!(manager.logout().is_none());
        assert!(manager.current().is_none());
    }
}
