//! Host collaborators
//!
//! The engine never reaches for global browser state. Everything it needs to
//! know about tabs, cookies and request rules comes through these seams.

use std::sync::Arc;

use sandtab_rules::RuleEngine;
use sandtab_session::ContextId;

use crate::error::RevocationError;

/// Read-only view of the host's browsing contexts
pub trait ContextQuery: Send + Sync {
    /// The context in the foreground right now, if any
    fn foreground_context(&self) -> Option<ContextId>;

    /// Current top-level URL of a context
    fn context_url(&self, context: ContextId) -> Option<String>;
}

/// A request to delete one browser credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationRequest {
    /// Origin the deletion is scoped to, `https://{domain}`
    pub url: String,
    pub name: String,
    /// Domain as it was captured (may carry a leading dot)
    pub domain: String,
}

impl RevocationRequest {
    pub fn new(name: impl Into<String>, domain: impl Into<String>) -> Self {
        let domain = domain.into();
        Self {
            url: format!("https://{}", domain.trim_start_matches('.')),
            name: name.into(),
            domain,
        }
    }
}

/// Deletes credentials from the host's cookie jar
pub trait CredentialRevoker: Send + Sync {
    fn revoke(&self, request: &RevocationRequest) -> Result<(), RevocationError>;
}

/// The host services an [`crate::Isolator`] is wired to
#[derive(Clone)]
pub struct Environment {
    pub contexts: Arc<dyn ContextQuery>,
    pub revoker: Arc<dyn CredentialRevoker>,
    pub rules: Arc<dyn RuleEngine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revocation_url_strips_leading_dot() {
        let request = RevocationRequest::new("auth", ".example.com");
        assert_eq!(request.url, "https://example.com");
        assert_eq!(request.domain, ".example.com");

        let request = RevocationRequest::new("auth", "example.com");
        assert_eq!(request.url, "https://example.com");
    }
}
