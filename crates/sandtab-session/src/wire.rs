//! Credential entries and their wire form
//!
//! A store is persisted, and replayed as a `Cookie` header value, as a run of
//! `name=value;domain` tokens, each followed by a single space:
//!
//! ```text
//! auth=xyz;example.com theme=dark;.example.com
//! ```
//!
//! There is no escaping. Names, values and domains containing whitespace or
//! `;` (or `=` in a name) do not survive the round trip; see
//! [`CredentialEntry::is_well_formed`].

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::Result;

/// A captured cookie fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialEntry {
    pub name: String,
    pub value: String,
    pub domain: String,
}

impl CredentialEntry {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
        }
    }

    /// Whether the entry can be rendered without corrupting neighbouring tokens
    pub fn is_well_formed(&self) -> bool {
        let clean = |s: &str| !s.chars().any(|c| c.is_whitespace() || c == ';');

        !self.name.is_empty()
            && !self.domain.is_empty()
            && clean(&self.name)
            && !self.name.contains('=')
            && clean(&self.value)
            && clean(&self.domain)
    }

    fn write_token(&self, out: &mut String) {
        out.push_str(&self.name);
        out.push('=');
        out.push_str(&self.value);
        out.push(';');
        out.push_str(&self.domain);
        out.push(' ');
    }
}

/// Render entries in order. Rendering is concatenative, so appending one
/// entry to a store is appending its rendering to the stored text.
pub fn serialize(entries: &[CredentialEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        entry.write_token(&mut out);
    }
    out
}

/// Parse the output of [`serialize`]
pub fn deserialize(text: &str) -> Result<Vec<CredentialEntry>> {
    text.split_whitespace().map(parse_token).collect()
}

/// Parse stored text, skipping tokens that do not parse.
///
/// Used where one bad token must not hide the rest of the store.
pub fn deserialize_lenient(text: &str) -> Vec<CredentialEntry> {
    text.split_whitespace()
        .filter_map(|token| match parse_token(token) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed credential token");
                None
            }
        })
        .collect()
}

fn parse_token(token: &str) -> Result<CredentialEntry> {
    let malformed = || SessionError::MalformedToken(token.to_string());

    let (pair, domain) = token.split_once(';').ok_or_else(malformed)?;
    let (name, value) = pair.split_once('=').ok_or_else(malformed)?;

    if name.is_empty() || domain.is_empty() {
        return Err(malformed());
    }

    Ok(CredentialEntry::new(name, value, domain))
}

/// `(name, domain)` pairs to revoke, read leniently from stored text.
///
/// Tokens missing a name or a domain are skipped rather than failing the
/// whole batch.
pub fn revocation_targets(text: &str) -> Vec<(String, String)> {
    text.split_whitespace()
        .filter_map(|token| {
            let mut parts = token.split(';');
            let pair = parts.next()?;
            let domain = parts.next()?;
            let name = pair.split('=').next()?;

            if name.is_empty() || domain.is_empty() {
                tracing::debug!(token = %token, "Skipping unrevocable token");
                return None;
            }

            Some((name.to_string(), domain.to_string()))
        })
        .collect()
}
