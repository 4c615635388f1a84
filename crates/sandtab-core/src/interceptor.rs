//! Credential Interceptor
//!
//! Attributes each newly set credential to the session of whichever context
//! is in the foreground when the change is delivered. A cookie written by a
//! background tab while another tab has focus lands in the focused tab's
//! session; that is a known limitation of delivery-time attribution.
//!
//! A credential whose name or value would not survive the wire form (it
//! contains whitespace, or the name contains `=` or `;`) is refused rather
//! than stored, since it could never be replayed intact.
//!
//! A context closed while a capture is in flight can have its record
//! recreated by the append. The interceptor re-checks the registry afterwards
//! and deletes such a record. The credential itself stays in the host's jar:
//! teardown has already run its revocations by then.

use parking_lot::RwLock;
use std::sync::Arc;

use sandtab_privacy::ExclusionList;
use sandtab_session::{ContextId, CredentialEntry, SessionId, SessionRegistry};

use crate::environment::ContextQuery;
use crate::error::IsolationError;
use crate::Result;

/// One notification from the host's cookie observer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialChange {
    pub entry: CredentialEntry,
    /// The credential was deleted rather than set
    pub removed: bool,
}

impl CredentialChange {
    pub fn added(entry: CredentialEntry) -> Self {
        Self {
            entry,
            removed: false,
        }
    }

    pub fn removed(entry: CredentialEntry) -> Self {
        Self {
            entry,
            removed: true,
        }
    }
}

/// What happened to a credential change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    Captured {
        context: ContextId,
        session: SessionId,
    },
    /// Deletions are never captured
    IgnoredRemoval,
    /// The credential's domain is on the exclusion list
    Excluded,
    NoForegroundContext,
    /// The credential cannot be written to the wire form unchanged
    Malformed,
    /// The foreground context has no session, or lost it mid-capture
    Unmanaged(ContextId),
    /// Capture was attempted and failed; the error has been logged
    Failed,
}

pub struct CredentialInterceptor {
    registry: SessionRegistry,
    contexts: Arc<dyn ContextQuery>,
    exclusions: Arc<RwLock<ExclusionList>>,
}

impl CredentialInterceptor {
    pub fn new(
        registry: SessionRegistry,
        contexts: Arc<dyn ContextQuery>,
        exclusions: Arc<RwLock<ExclusionList>>,
    ) -> Self {
        Self {
            registry,
            contexts,
            exclusions,
        }
    }

    pub fn observe(&self, change: &CredentialChange) -> Result<Capture> {
        if change.removed {
            return Ok(Capture::IgnoredRemoval);
        }

        let entry = &change.entry;

        if self.exclusions.read().excludes_domain(&entry.domain) {
            tracing::info!(domain = %entry.domain, "Credential ignored for excluded domain");
            return Ok(Capture::Excluded);
        }

        let Some(context) = self.contexts.foreground_context() else {
            return Ok(Capture::NoForegroundContext);
        };

        let Some(session) = self.registry.lookup(context) else {
            return Ok(Capture::Unmanaged(context));
        };

        if !entry.is_well_formed() {
            tracing::warn!(
                session = %session,
                name = %entry.name,
                domain = %entry.domain,
                "Credential refused, it does not survive the wire form unchanged"
            );
            return Ok(Capture::Malformed);
        }

        let store = self.registry.store();
        store
            .append(&session, entry)
            .map_err(IsolationError::StorageWrite)?;

        if self.registry.lookup(context).as_ref() != Some(&session) {
            tracing::warn!(
                context = %context,
                session = %session,
                "Session closed during capture, discarding its record"
            );
            store
                .delete(&session)
                .map_err(IsolationError::StorageWrite)?;
            return Ok(Capture::Unmanaged(context));
        }

        self.registry.record_capture(context);

        tracing::debug!(
            context = %context,
            session = %session,
            name = %entry.name,
            domain = %entry.domain,
            "Captured credential"
        );

        Ok(Capture::Captured { context, session })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeContexts;
    use parking_lot::Mutex;
    use sandtab_session::CredentialStore;
    use sandtab_storage::{KeyValueStore, MemoryStore};

    type Hook = Box<dyn Fn() + Send + Sync>;

    /// Runs a hook before every read, once one is installed
    #[derive(Default)]
    struct HookedStore {
        inner: MemoryStore,
        before_get: Mutex<Option<Hook>>,
    }

    impl KeyValueStore for HookedStore {
        fn get(&self, key: &str) -> sandtab_storage::Result<Option<String>> {
            if let Some(hook) = self.before_get.lock().take() {
                hook();
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> sandtab_storage::Result<()> {
            self.inner.set(key, value)
        }

        fn delete(&self, key: &str) -> sandtab_storage::Result<()> {
            self.inner.delete(key)
        }
    }

    struct Fixture {
        interceptor: CredentialInterceptor,
        registry: SessionRegistry,
        contexts: Arc<FakeContexts>,
    }

    fn fixture() -> Fixture {
        let store = CredentialStore::new(Arc::new(MemoryStore::new()));
        let registry = SessionRegistry::new(store);
        let contexts = Arc::new(FakeContexts::default());
        let exclusions = Arc::new(RwLock::new(ExclusionList::default()));
        let interceptor =
            CredentialInterceptor::new(registry.clone(), contexts.clone(), exclusions);

        Fixture {
            interceptor,
            registry,
            contexts,
        }
    }

    fn auth() -> CredentialEntry {
        CredentialEntry::new("auth", "xyz", "example.com")
    }

    #[test]
    fn test_captures_into_foreground_session_only() {
        let f = fixture();
        let a = f.registry.create(ContextId(1)).unwrap();
        let b = f.registry.create(ContextId(2)).unwrap();
        f.contexts.focus(Some(1));

        let capture = f.interceptor.observe(&CredentialChange::added(auth())).unwrap();
        assert_eq!(
            capture,
            Capture::Captured {
                context: ContextId(1),
                session: a.clone()
            }
        );

        let store = f.registry.store();
        assert_eq!(store.read_all(&a).unwrap(), vec![auth()]);
        assert!(store.read_all(&b).unwrap().is_empty());
        assert_eq!(f.registry.get(ContextId(1)).unwrap().captured, 1);
    }

    #[test]
    fn test_removals_are_ignored() {
        let f = fixture();
        let session = f.registry.create(ContextId(1)).unwrap();
        f.contexts.focus(Some(1));

        let capture = f.interceptor.observe(&CredentialChange::removed(auth())).unwrap();
        assert_eq!(capture, Capture::IgnoredRemoval);
        assert!(f.registry.store().read_all(&session).unwrap().is_empty());
    }

    #[test]
    fn test_excluded_domain_never_captured() {
        let f = fixture();
        let session = f.registry.create(ContextId(1)).unwrap();
        f.contexts.focus(Some(1));

        for domain in ["github.com", ".github.com", "api.github.com"] {
            let change = CredentialChange::added(CredentialEntry::new("user_session", "s", domain));
            assert_eq!(f.interceptor.observe(&change).unwrap(), Capture::Excluded);
        }
        assert!(f.registry.store().read_all(&session).unwrap().is_empty());
    }

    #[test]
    fn test_no_foreground_or_unmanaged_context() {
        let f = fixture();
        let change = CredentialChange::added(auth());

        assert_eq!(
            f.interceptor.observe(&change).unwrap(),
            Capture::NoForegroundContext
        );

        f.contexts.focus(Some(9));
        assert_eq!(
            f.interceptor.observe(&change).unwrap(),
            Capture::Unmanaged(ContextId(9))
        );
    }

    #[test]
    fn test_malformed_credential_refused() {
        let f = fixture();
        let session = f.registry.create(ContextId(1)).unwrap();
        f.contexts.focus(Some(1));

        for entry in [
            CredentialEntry::new("pref", "dark mode", "example.com"),
            CredentialEntry::new("a=b", "1", "example.com"),
            CredentialEntry::new("", "1", "example.com"),
        ] {
            let capture = f.interceptor.observe(&CredentialChange::added(entry)).unwrap();
            assert_eq!(capture, Capture::Malformed);
        }

        assert_eq!(f.registry.store().read_raw(&session).unwrap().as_deref(), Some(""));
        assert_eq!(f.registry.get(ContextId(1)).unwrap().captured, 0);
    }

    #[test]
    fn test_close_during_capture_leaves_no_record() {
        let kv = Arc::new(HookedStore::default());
        let registry = SessionRegistry::new(CredentialStore::new(kv.clone()));
        let contexts = Arc::new(FakeContexts::default());
        let interceptor = CredentialInterceptor::new(
            registry.clone(),
            contexts.clone(),
            Arc::new(RwLock::new(ExclusionList::default())),
        );

        let session = registry.create(ContextId(4)).unwrap();
        contexts.focus(Some(4));

        // Teardown lands between the lookup and the store write
        let closing = registry.clone();
        let records = kv.inner.clone();
        let closed = session.clone();
        *kv.before_get.lock() = Some(Box::new(move || {
            closing.remove(ContextId(4));
            records.delete(closed.as_str()).unwrap();
        }));

        let capture = interceptor.observe(&CredentialChange::added(auth())).unwrap();

        assert_eq!(capture, Capture::Unmanaged(ContextId(4)));
        assert!(kv.inner.is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicates_accumulate() {
        let f = fixture();
        let session = f.registry.create(ContextId(1)).unwrap();
        f.contexts.focus(Some(1));

        let first = CredentialEntry::new("sid", "1", "example.com");
        let second = CredentialEntry::new("sid", "2", "example.com");
        f.interceptor.observe(&CredentialChange::added(first.clone())).unwrap();
        f.interceptor.observe(&CredentialChange::added(second.clone())).unwrap();

        assert_eq!(
            f.registry.store().read_all(&session).unwrap(),
            vec![first, second]
        );
    }
}
