use super::{Session, SessionStore};
use crate::ids::SessionId;
use crate::security::{AuthError, Identity};
use dashmap::DashMap;
use std::time::{Duration, SystemTime};
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    identity: Identity,
    session: Session,
}

/// In-process session store
///
/// Sessions are created by [`bind`](Self::bind), typically from a login
/// handler on a `SessionMode::On` route after it checked the user's
/// credentials. A session idle for longer than `idle_timeout` is dropped on its
/// next validation.
#[derive(Debug)]
pub struct MemorySessionStore {
    key: String,
    idle_timeout: Duration,
    entries: DashMap<String, Entry>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new(key: &str, idle_timeout: Duration) -> Self {
        Self {
            key: key.to_string(),
            idle_timeout,
            entries: DashMap::new(),
        }
    }

    /// Bind `value` (a session ID handed out earlier) to an authenticated user
    pub fn bind(&self, value: &str, identity: Identity) -> Session {
        let session = Session::new(&self.key, value);
        debug!(username = %identity.username, "Session bound");
        self.entries.insert(
            value.to_string(),
            Entry {
                identity,
                session: session.clone(),
            },
        );
        session
    }

    /// Current record for `value`, without refreshing it
    #[must_use]
    pub fn get(&self, value: &str) -> Option<Session> {
        self.entries.get(value).map(|e| e.session.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every session idle for longer than the timeout
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        let now = SystemTime::now();
        self.entries
            .retain(|_, e| !Self::is_idle(&e.session, now, self.idle_timeout));
        before - self.entries.len()
    }

    fn is_idle(session: &Session, now: SystemTime, timeout: Duration) -> bool {
        now.duration_since(session.last_activity)
            .map(|idle| idle > timeout)
            .unwrap_or(false)
    }
}

impl SessionStore for MemorySessionStore {
    fn validate(&self, value: &str) -> Result<Identity, AuthError> {
        let username = {
            let entry = self.entries.get(value).ok_or_else(|| AuthError::SessionInvalid {
                reason: "unknown session".to_string(),
            })?;
            if !Self::is_idle(&entry.session, SystemTime::now(), self.idle_timeout) {
                return Ok(entry.identity.clone());
            }
            entry.identity.username.clone()
        };
        // The read guard must be gone before removing from the same shard
        self.entries.remove(value);
        debug!(username = %username, "Session expired");
        Err(AuthError::SessionExpired)
    }

    fn generate_id(&self) -> String {
        SessionId::new().to_string()
    }

    fn touch(&self, value: &str) -> Option<Session> {
        let mut entry = self.entries.get_mut(value)?;
        entry.session.last_activity = SystemTime::now();
        Some(entry.session.clone())
    }

    fn invalidate(&self, value: &str) {
        if self.entries.remove(value).is_some() {
            debug!("Session invalidated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_validate_invalidate() {
        let store = MemorySessionStore::new("sid", Duration::from_secs(60));
        let id = store.generate_id();
        assert!(matches!(
            store.validate(&id),
            Err(AuthError::SessionInvalid { .. })
        ));

        store.bind(&id, Identity::new("alice"));
        assert_eq!(store.validate(&id).unwrap().username, "alice");

        store.invalidate(&id);
        assert!(store.validate(&id).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_touch_moves_last_activity_forward() {
        let store = MemorySessionStore::new("sid", Duration::from_secs(60));
        let created = store.bind("abc", Identity::new("bob"));
        std::thread::sleep(Duration::from_millis(5));
        let touched = store.touch("abc").unwrap();
        assert_eq!(touched.created, created.created);
        assert!(touched.last_activity > created.last_activity);
        assert!(store.touch("missing").is_none());
    }

    #[test]
    fn test_idle_sessions_expire() {
        let store = MemorySessionStore::new("sid", Duration::ZERO);
        store.bind("abc", Identity::new("carol"));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.validate("abc"), Err(AuthError::SessionExpired));
        assert!(store.get("abc").is_none());

        store.bind("def", Identity::new("dave"));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.purge_expired(), 1);
    }
}
