//! Session Registry
//!
//! The single authority over which context owns which session.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

use crate::context::{ContextId, SessionId};
use crate::session::{Session, SessionState};
use crate::store::CredentialStore;
use crate::Result;

pub struct SessionRegistry {
    /// Live sessions by owning context
    sessions: Arc<RwLock<HashMap<ContextId, Session>>>,
    /// Last creation timestamp handed out, in epoch millis
    last_issued_ms: Arc<Mutex<i64>>,
    store: CredentialStore,
}

impl SessionRegistry {
    pub fn new(store: CredentialStore) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            last_issued_ms: Arc::new(Mutex::new(i64::MIN)),
            store,
        }
    }

    /// Create a session for `context` with an empty credential store.
    ///
    /// The mapping is recorded only once the store exists, so a storage
    /// failure leaves the context unmanaged.
    pub fn create(&self, context: ContextId) -> Result<SessionId> {
        let session = Session::new(context, self.next_created_at());
        self.store.initialize(&session.id)?;

        let id = session.id.clone();
        let previous = self.sessions.write().insert(context, session);

        if let Some(previous) = previous {
            tracing::warn!(
                context = %context,
                session = %previous.id,
                "Replaced a session that was never torn down"
            );
        }

        tracing::info!(context = %context, session = %id, "Created session");

        Ok(id)
    }

    pub fn lookup(&self, context: ContextId) -> Option<SessionId> {
        self.sessions.read().get(&context).map(|s| s.id.clone())
    }

    pub fn get(&self, context: ContextId) -> Option<Session> {
        self.sessions.read().get(&context).cloned()
    }

    /// Forget the mapping and hand back the session for cleanup.
    /// Removing an unknown context returns `None`.
    pub fn remove(&self, context: ContextId) -> Option<Session> {
        self.sessions.write().remove(&context)
    }

    /// Move the context's session to `Active`
    pub fn mark_active(&self, context: ContextId) -> Option<Session> {
        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(&context)?;
        activate(session);
        Some(session.clone())
    }

    /// Count a captured credential against the context's session
    pub fn record_capture(&self, context: ContextId) -> Option<Session> {
        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(&context)?;
        activate(session);
        session.captured += 1;
        Some(session.clone())
    }

    /// All live sessions, oldest first
    pub fn list(&self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self.sessions.read().values().cloned().collect();
        sessions.sort_by_key(|s| s.created_at);
        sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Strictly increasing creation times keep derived ids unique even when a
    /// context is reopened within the same millisecond.
    fn next_created_at(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let mut last = self.last_issued_ms.lock();

        let millis = now.timestamp_millis().max(last.saturating_add(1));
        *last = millis;

        DateTime::from_timestamp_millis(millis).unwrap_or(now)
    }
}

fn activate(session: &mut Session) {
    if let Err(e) = session.transition_to(SessionState::Active) {
        tracing::warn!(session = %session.id, error = %e, "Session not activated");
    }
}

impl Clone for SessionRegistry {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            last_issued_ms: Arc::clone(&self.last_issued_ms),
            store: self.store.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use sandtab_storage::{KeyValueStore, MemoryStore, StorageError};
    use std::collections::HashSet;

    fn registry() -> (SessionRegistry, MemoryStore) {
        let kv = MemoryStore::new();
        let store = CredentialStore::new(Arc::new(kv.clone()));
        (SessionRegistry::new(store), kv)
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> sandtab_storage::Result<Option<String>> {
            Err(StorageError::Unavailable("read".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> sandtab_storage::Result<()> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        fn delete(&self, _key: &str) -> sandtab_storage::Result<()> {
            Err(StorageError::Unavailable("delete".to_string()))
        }
    }

    #[test]
    fn test_create_lookup_remove() {
        let (registry, kv) = registry();

        let id = registry.create(ContextId(7)).unwrap();
        assert!(id.as_str().starts_with("session-7-"));
        assert_eq!(registry.lookup(ContextId(7)), Some(id.clone()));
        assert_eq!(kv.get(id.as_str()).unwrap().as_deref(), Some(""));

        let session = registry.get(ContextId(7)).unwrap();
        assert_eq!(session.state, SessionState::Created);

        let removed = registry.remove(ContextId(7)).unwrap();
        assert_eq!(removed.id, id);
        assert_eq!(registry.lookup(ContextId(7)), None);

        // Idempotent
        assert!(registry.remove(ContextId(7)).is_none());
    }

    #[test]
    fn test_session_ids_never_reused() {
        let (registry, _kv) = registry();
        let mut seen = HashSet::new();

        for _ in 0..50 {
            let id = registry.create(ContextId(1)).unwrap();
            assert!(seen.insert(id));
            registry.remove(ContextId(1));
        }
    }

    #[test]
    fn test_create_failure_leaves_context_unmanaged() {
        let store = CredentialStore::new(Arc::new(BrokenStore));
        let registry = SessionRegistry::new(store);

        let err = registry.create(ContextId(4)).unwrap_err();
        assert!(matches!(err, SessionError::Storage(_)));
        assert_eq!(registry.lookup(ContextId(4)), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_capture_activates_session() {
        let (registry, _kv) = registry();
        registry.create(ContextId(2)).unwrap();

        let session = registry.record_capture(ContextId(2)).unwrap();
        assert_eq!(session.state, SessionState::Active);
        assert_eq!(session.captured, 1);

        registry.record_capture(ContextId(2)).unwrap();
        assert_eq!(registry.get(ContextId(2)).unwrap().captured, 2);

        assert!(registry.mark_active(ContextId(99)).is_none());
    }

    #[test]
    fn test_list_is_oldest_first() {
        let (registry, _kv) = registry();
        let first = registry.create(ContextId(5)).unwrap();
        let second = registry.create(ContextId(3)).unwrap();

        let ids: Vec<SessionId> = registry.list().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![first, second]);
        assert_eq!(registry.len(), 2);
    }
}
