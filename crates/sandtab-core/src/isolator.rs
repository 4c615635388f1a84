//! Process-level isolation engine
//!
//! Owns configuration, the exclusion list and every component, and exposes
//! the hooks the host calls. Hooks never fail across contexts: whatever goes
//! wrong while handling one context is logged and stays with that context.

use parking_lot::RwLock;
use std::sync::Arc;

use sandtab_privacy::ExclusionList;
use sandtab_rules::{HeaderRuleProjector, Projection};
use sandtab_session::{ContextId, CredentialStore, Session, SessionId, SessionRegistry};
use sandtab_storage::{Database, KeyValueStore};

use crate::config::Config;
use crate::environment::{ContextQuery, Environment};
use crate::error::IsolationError;
use crate::interceptor::{Capture, CredentialChange, CredentialInterceptor};
use crate::lifecycle::{SessionLifecycleController, Teardown};
use crate::Result;

const EXCLUDED_DOMAINS_SETTING: &str = "excluded_domains";

pub struct Isolator {
    config: Config,
    /// Present when the session store is SQLite-backed; also holds settings
    db: Option<Database>,
    exclusions: Arc<RwLock<ExclusionList>>,
    registry: SessionRegistry,
    interceptor: CredentialInterceptor,
    projector: Arc<HeaderRuleProjector>,
    controller: SessionLifecycleController,
    contexts: Arc<dyn ContextQuery>,
}

impl Isolator {
    /// Open the configured database and wire the engine to the host
    pub fn new(config: Config, env: Environment) -> Result<Self> {
        config.validate()?;

        let db = match &config.database_path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                Database::open(path)?
            }
            None => Database::open_in_memory()?,
        };

        let kv: Arc<dyn KeyValueStore> = Arc::new(db.clone());
        Ok(Self::assemble(config, env, kv, Some(db)))
    }

    /// Use a caller-supplied key-value store; settings are not persisted
    pub fn with_store(
        config: Config,
        env: Environment,
        kv: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, env, kv, None))
    }

    fn assemble(
        config: Config,
        env: Environment,
        kv: Arc<dyn KeyValueStore>,
        db: Option<Database>,
    ) -> Self {
        let exclusions = Arc::new(RwLock::new(ExclusionList::new(&config.excluded_domains)));
        let store = CredentialStore::new(kv);
        let registry = SessionRegistry::new(store.clone());

        let projector = Arc::new(HeaderRuleProjector::new(
            store,
            env.rules,
            Arc::clone(&exclusions),
            config.rule_priority,
        ));
        let interceptor = CredentialInterceptor::new(
            registry.clone(),
            Arc::clone(&env.contexts),
            Arc::clone(&exclusions),
        );
        let controller =
            SessionLifecycleController::new(registry.clone(), Arc::clone(&projector), env.revoker);

        Self {
            config,
            db,
            exclusions,
            registry,
            interceptor,
            projector,
            controller,
            contexts: env.contexts,
        }
    }

    /// Sweep leftovers from a previous run and apply persisted settings.
    ///
    /// Call once, before the first context is opened.
    pub fn initialize(&self) -> Result<()> {
        if let Some(db) = &self.db {
            db.clear_sessions()?;

            if let Some(domains) = db.get_setting_json::<Vec<String>>(EXCLUDED_DOMAINS_SETTING)? {
                self.exclusions.write().set_domains(domains);
            }
        }

        tracing::info!(
            excluded_domains = self.exclusions.read().len(),
            rule_priority = self.config.rule_priority,
            "Isolation engine initialized"
        );

        Ok(())
    }

    // === Host hooks ===

    /// A context was opened for isolated browsing
    pub fn on_open(&self, context: ContextId) -> Result<SessionId> {
        self.controller.on_open(context).inspect_err(|e| {
            tracing::error!(context = %context, error = %e, "Context left unmanaged");
        })
    }

    /// The host's cookie observer reported a change
    pub fn on_credential_changed(&self, change: &CredentialChange) -> Capture {
        match self.interceptor.observe(change) {
            Ok(capture) => capture,
            Err(e) => {
                tracing::error!(
                    name = %change.entry.name,
                    domain = %change.entry.domain,
                    error = %e,
                    "Credential not captured"
                );
                Capture::Failed
            }
        }
    }

    /// A context came to the foreground; refresh its header rule.
    ///
    /// Returns `None` for unmanaged contexts and when projection failed, in
    /// which case the context runs without cookie injection until the next
    /// activation.
    pub fn on_activate(&self, context: ContextId) -> Option<Projection> {
        let session = self.registry.mark_active(context)?;
        let url = self.contexts.context_url(context);

        match self.projector.project(context, &session.id, url.as_deref()) {
            Ok(projection) => Some(projection),
            Err(e) => {
                let e = IsolationError::from(e);
                tracing::warn!(
                    context = %context,
                    session = %session.id,
                    error = %e,
                    "Header injection skipped"
                );
                None
            }
        }
    }

    /// A context was closed; revoke and forget its session
    pub fn on_close(&self, context: ContextId) -> Teardown {
        self.controller.on_close(context)
    }

    // === Inspection and settings ===

    pub fn sessions(&self) -> Vec<Session> {
        self.registry.list()
    }

    pub fn session_for(&self, context: ContextId) -> Option<Session> {
        self.registry.get(context)
    }

    pub fn excluded_domains(&self) -> Vec<String> {
        self.exclusions.read().domains()
    }

    /// Replace the exclusion list, persisting it when a database is in use
    pub fn set_excluded_domains(&self, domains: Vec<String>) -> Result<()> {
        let list = ExclusionList::new(&domains);

        if let Some(db) = &self.db {
            db.set_setting_json(EXCLUDED_DOMAINS_SETTING, &list.domains())?;
        }

        tracing::info!(excluded_domains = list.len(), "Updated exclusion list");
        *self.exclusions.write() = list;

        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
