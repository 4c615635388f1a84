//! Session Lifecycle Controller
//!
//! Opening a context allocates its session; closing it revokes every
//! credential the session captured, evicts the store and removes the
//! context's header rule. Teardown is best-effort per step: a failed step is
//! logged and the remaining steps still run.

use std::sync::Arc;

use sandtab_rules::HeaderRuleProjector;
use sandtab_session::{wire, ContextId, SessionId, SessionRegistry, SessionState};

use crate::environment::{CredentialRevoker, RevocationRequest};
use crate::error::IsolationError;
use crate::Result;

/// Outcome of closing a context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Teardown {
    /// The context had no session (never opened, or already closed)
    NotManaged,
    Closed {
        session: SessionId,
        /// Credentials the host confirmed deleted
        revoked: usize,
        /// Credentials whose deletion failed
        failed: usize,
    },
}

pub struct SessionLifecycleController {
    registry: SessionRegistry,
    projector: Arc<HeaderRuleProjector>,
    revoker: Arc<dyn CredentialRevoker>,
}

impl SessionLifecycleController {
    pub fn new(
        registry: SessionRegistry,
        projector: Arc<HeaderRuleProjector>,
        revoker: Arc<dyn CredentialRevoker>,
    ) -> Self {
        Self {
            registry,
            projector,
            revoker,
        }
    }

    /// Allocate a session for a newly opened context.
    ///
    /// A context that still owns a session is having it replaced, so the old
    /// one is torn down first.
    pub fn on_open(&self, context: ContextId) -> Result<SessionId> {
        if let Some(previous) = self.registry.lookup(context) {
            tracing::warn!(
                context = %context,
                session = %previous,
                "Context reopened, tearing down previous session"
            );
            self.on_close(context);
        }

        self.registry
            .create(context)
            .map_err(IsolationError::Allocation)
    }

    pub fn on_close(&self, context: ContextId) -> Teardown {
        let Some(mut session) = self.registry.remove(context) else {
            return Teardown::NotManaged;
        };

        if let Err(e) = session.transition_to(SessionState::Closing) {
            tracing::warn!(session = %session.id, error = %e, "Unexpected session state on close");
        }

        tracing::info!(
            context = %context,
            session = %session.id,
            "Context closed, cleaning up session credentials"
        );

        let (revoked, failed) = self.revoke_session(&session.id);

        if let Err(e) = self.registry.store().delete(&session.id) {
            let e = IsolationError::StorageWrite(e);
            tracing::error!(session = %session.id, error = %e, "Credential store not deleted");
        }

        if let Err(e) = self.projector.retract(context) {
            let e = IsolationError::from(e);
            tracing::error!(context = %context, error = %e, "Header rule not removed");
        }

        if let Err(e) = session.transition_to(SessionState::Gone) {
            tracing::warn!(session = %session.id, error = %e, "Unexpected session state after close");
        }

        tracing::info!(
            session = %session.id,
            revoked,
            failed,
            "Session cleaned up"
        );

        Teardown::Closed {
            session: session.id,
            revoked,
            failed,
        }
    }

    /// Delete every credential recorded for the session from the host.
    /// Returns `(revoked, failed)` counts.
    fn revoke_session(&self, session: &SessionId) -> (usize, usize) {
        let text = match self.registry.store().read_raw(session) {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::error!(session = %session, "Credential store missing for closing session");
                return (0, 0);
            }
            Err(e) => {
                let e = IsolationError::StorageRead(e);
                tracing::error!(session = %session, error = %e, "Credential store unreadable");
                return (0, 0);
            }
        };

        let mut revoked = 0;
        let mut failed = 0;

        for (name, domain) in wire::revocation_targets(&text) {
            match self.revoke(&name, &domain) {
                Ok(()) => revoked += 1,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(session = %session, error = %e, "Credential not revoked");
                }
            }
        }

        (revoked, failed)
    }

    fn revoke(&self, name: &str, domain: &str) -> Result<()> {
        let request = RevocationRequest::new(name, domain);
        self.revoker
            .revoke(&request)
            .map_err(|source| IsolationError::Revocation {
                domain: request.domain.clone(),
                name: request.name.clone(),
                source,
            })
    }
}
