//! # Session Registry
//!
//! The process-wide set of authenticated identities. A "session" is nothing
//! more than membership in this set: no timestamps, no expiry, no metadata.
//! Sessions live until an explicit logout (or process restart - nothing is
//! persisted).
//!
//! One registry instance is created at startup and shared behind an `Arc`
//! by every event-handling task; it is never a hidden global, so tests can
//! run any number of isolated instances. All operations take `&self` and
//! hold the internal lock only for the duration of the set operation, which
//! keeps membership changes atomic per identity without any cross-identity
//! coordination.

use std::collections::HashSet;
use std::sync::RwLock;

/// Stable identity of a user across events (Telegram user id).
pub type UserId = i64;

#[derive(Debug, Default)]
pub struct SessionRegistry {
    authenticated: RwLock<HashSet<UserId>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self, user: UserId) -> bool {
        self.read_set().contains(&user)
    }

    /// Add `user` to the set. Idempotent: granting an existing session is a
    /// no-op and the set never holds more than one entry per identity.
    pub fn grant(&self, user: UserId) {
        self.write_set().insert(user);
    }

    /// Remove `user`'s session. Returns whether one existed, so callers can
    /// tell "logged out" apart from "was not logged in".
    pub fn revoke(&self, user: UserId) -> bool {
        self.write_set().remove(&user)
    }

    pub fn count(&self) -> usize {
        self.read_set().len()
    }

    /// Snapshot of all authenticated identities, in no particular order.
    pub fn list(&self) -> Vec<UserId> {
        self.read_set().iter().copied().collect()
    }

    fn read_set(&self) -> std::sync::RwLockReadGuard<'_, HashSet<UserId>> {
        self.authenticated
            .read()
            .expect("session registry lock poisoned")
    }

    fn write_set(&self) -> std::sync::RwLockWriteGuard<'_, HashSet<UserId>> {
        self.authenticated
            .write()
            .expect("session registry lock poisoned")
    }
}
