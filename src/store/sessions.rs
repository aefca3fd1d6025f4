//! Per-username session state for the rule detector, including the lock
//! flag. In-memory for the process lifetime; sessions are created lazily on
//! first use.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::SentinelError;
use crate::models::UserSession;

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, UserSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore::default()
    }

    /// Run a closure against the named session under the write lock,
    /// creating the session if it does not exist yet. Holding the lock for
    /// the whole closure serializes read-modify-write sequences on the same
    /// username (scoring, lock transitions, last-seen updates).
    pub fn with_session<F, R>(&self, username: &str, f: F) -> R
    where
        F: FnOnce(&mut UserSession) -> R,
    {
        let mut sessions = self.sessions.write();
        let session = sessions
            .entry(username.to_string())
            .or_insert_with(|| UserSession::new(username));
        f(session)
    }

    pub fn get(&self, username: &str) -> Option<UserSession> {
        self.sessions.read().get(username).cloned()
    }

    pub fn is_locked(&self, username: &str) -> bool {
        self.sessions.read().get(username).map(|s| s.locked).unwrap_or(false)
    }

    /// Administrative lock, outside the scoring path. Creates the session
    /// when the username has not been seen yet.
    pub fn lock(&self, username: &str) {
        self.with_session(username, |session| session.locked = true);
    }

    /// Explicit unlock command. Unknown usernames are an error: there is no
    /// session to unlock.
    pub fn unlock(&self, username: &str) -> Result<(), SentinelError> {
        let mut sessions = self.sessions.write();
        match sessions.get_mut(username) {
            Some(session) => {
                session.locked = false;
                Ok(())
            }
            None => Err(SentinelError::SessionNotFound { username: username.to_string() }),
        }
    }

    pub fn snapshot(&self) -> HashMap<String, UserSession> {
        self.sessions.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_are_created_lazily() {
        let store = SessionStore::new();
        assert!(store.get("alice").is_none());

        store.with_session("alice", |session| {
            session.last_location = Some("US".into());
        });
        let session = store.get("alice").unwrap();
        assert_eq!(session.username, "alice");
        assert_eq!(session.last_location.as_deref(), Some("US"));
    }

    #[test]
    fn lock_persists_until_explicit_unlock() {
        let store = SessionStore::new();
        store.lock("alice");
        assert!(store.is_locked("alice"));

        store.unlock("alice").unwrap();
        assert!(!store.is_locked("alice"));
    }

    #[test]
    fn unlock_of_unknown_user_is_an_error() {
        let store = SessionStore::new();
        assert!(matches!(
            store.unlock("nobody"),
            Err(SentinelError::SessionNotFound { .. })
        ));
    }

    #[test]
    fn unknown_users_are_not_locked() {
        let store = SessionStore::new();
        assert!(!store.is_locked("nobody"));
    }
}
