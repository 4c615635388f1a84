//! Isolation error types
//!
//! Every failure stays inside the handler that hit it: the hooks on
//! [`crate::Isolator`] log these and carry on, except allocation failures,
//! which are surfaced to the caller of `on_open`.

use thiserror::Error;

use sandtab_session::SessionError;

#[derive(Error, Debug)]
pub enum IsolationError {
    /// The session could not be created; the context stays unmanaged
    #[error("Session allocation failed: {0}")]
    Allocation(#[source] SessionError),

    #[error("Credential store read failed: {0}")]
    StorageRead(#[source] SessionError),

    #[error("Credential store write failed: {0}")]
    StorageWrite(#[source] SessionError),

    #[error("Rule engine error: {0}")]
    RuleEngine(#[from] sandtab_rules::RulesError),

    #[error("Revoking {name} on {domain} failed: {source}")]
    Revocation {
        domain: String,
        name: String,
        #[source]
        source: RevocationError,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] sandtab_storage::StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure reported by the host when deleting a browser credential
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct RevocationError(pub String);
