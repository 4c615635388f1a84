//! Sandtab Core
//!
//! Per-context cookie isolation. Each managed tab gets an ephemeral
//! credential store; cookies set while the tab is in the foreground are
//! captured into it, replayed to that tab alone through a `Cookie` header
//! rule, and revoked when the tab closes.
//!
//! The host drives everything through four hooks on [`Isolator`]:
//! `on_open`, `on_credential_changed`, `on_activate` and `on_close`.

mod config;
mod environment;
mod error;
mod interceptor;
mod isolator;
mod lifecycle;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use environment::{ContextQuery, CredentialRevoker, Environment, RevocationRequest};
pub use error::{IsolationError, RevocationError};
pub use interceptor::{Capture, CredentialChange, CredentialInterceptor};
pub use isolator::Isolator;
pub use lifecycle::{SessionLifecycleController, Teardown};

// Re-export core components
pub use sandtab_privacy::ExclusionList;
pub use sandtab_rules::{
    HeaderRule, HeaderRuleProjector, InMemoryRuleEngine, Projection, RuleEngine, RulesError,
};
pub use sandtab_session::{
    wire, ContextId, CredentialEntry, CredentialStore, Session, SessionError, SessionId,
    SessionRegistry, SessionState,
};
pub use sandtab_storage::{Database, KeyValueStore, MemoryStore, StorageError};

pub type Result<T> = std::result::Result<T, IsolationError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
