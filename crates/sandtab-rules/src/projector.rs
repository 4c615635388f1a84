//! Header Rule Projector
//!
//! Compiles a session's credential store into the context's `Cookie` rule.
//! Projection runs on context activation, not on every capture, so the
//! installed rule can lag the store until the context is activated again.

use parking_lot::RwLock;
use std::sync::Arc;

use sandtab_privacy::ExclusionList;
use sandtab_session::{wire, ContextId, CredentialStore, SessionId};

use crate::engine::RuleEngine;
use crate::rule::HeaderRule;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// The rule now in force for the context
    Installed(HeaderRule),
    /// The context is showing an excluded site; the rule was left as is
    Skipped,
}

pub struct HeaderRuleProjector {
    store: CredentialStore,
    engine: Arc<dyn RuleEngine>,
    exclusions: Arc<RwLock<ExclusionList>>,
    priority: u32,
}

impl HeaderRuleProjector {
    pub fn new(
        store: CredentialStore,
        engine: Arc<dyn RuleEngine>,
        exclusions: Arc<RwLock<ExclusionList>>,
        priority: u32,
    ) -> Self {
        Self {
            store,
            engine,
            exclusions,
            priority,
        }
    }

    /// Replace the context's rule with one carrying the session's credentials
    pub fn project(
        &self,
        context: ContextId,
        session: &SessionId,
        context_url: Option<&str>,
    ) -> Result<Projection> {
        if let Some(url) = context_url {
            if self.exclusions.read().excludes_url(url) {
                tracing::info!(context = %context, url = %url, "Header rule skipped for excluded site");
                return Ok(Projection::Skipped);
            }
        }

        let mut entries = self.store.read_valid(session)?;
        {
            let exclusions = self.exclusions.read();
            entries.retain(|entry| !exclusions.excludes_domain(&entry.domain));
        }

        let value = wire::serialize(&entries);
        let rule = HeaderRule::cookie(context, self.priority, value);

        tracing::info!(
            context = %context,
            session = %session,
            credentials = entries.len(),
            "Updating header rule"
        );

        self.engine.remove(context)?;
        self.engine.install(rule.clone())?;

        Ok(Projection::Installed(rule))
    }

    /// Remove the context's rule, if any
    pub fn retract(&self, context: ContextId) -> Result<()> {
        self.engine.remove(context)
    }
}
