//! Domain exclusion list
//!
//! Matching is by registrable suffix on a label boundary: `github.com`
//! excludes `github.com`, `.github.com` and `api.github.com`, but not
//! `notgithub.com`. Page URLs are matched on their host only, so a query
//! string or path mentioning an excluded domain does not exclude the page.
//! This is stricter than a plain substring test on the domain or URL, which
//! would also catch look-alike hosts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use url::Url;

/// Domains left alone unless configured otherwise
pub const DEFAULT_EXCLUDED_DOMAINS: &[&str] = &["github.com"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExclusionList {
    domains: BTreeSet<String>,
}

impl ExclusionList {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::empty();
        list.set_domains(domains);
        list
    }

    pub fn empty() -> Self {
        Self {
            domains: BTreeSet::new(),
        }
    }

    /// Replace the whole list
    pub fn set_domains<I, S>(&mut self, domains: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.domains = domains
            .into_iter()
            .filter_map(|d| normalize(d.as_ref()))
            .collect();
    }

    pub fn add(&mut self, domain: &str) -> bool {
        match normalize(domain) {
            Some(domain) => self.domains.insert(domain),
            None => false,
        }
    }

    pub fn domains(&self) -> Vec<String> {
        self.domains.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Check a cookie domain (leading dot allowed) against the list
    pub fn excludes_domain(&self, domain: &str) -> bool {
        let Some(domain) = normalize(domain) else {
            return false;
        };

        self.domains.iter().any(|excluded| {
            domain == *excluded
                || domain
                    .strip_suffix(excluded.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// Check the host of a page URL against the list.
    ///
    /// URLs without a host (`about:blank`, `data:`) are never excluded.
    pub fn excludes_url(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => parsed
                .host_str()
                .is_some_and(|host| self.excludes_domain(host)),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Unparseable context URL");
                false
            }
        }
    }
}

impl Default for ExclusionList {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_DOMAINS.iter().copied())
    }
}

fn normalize(domain: &str) -> Option<String> {
    let domain = domain.trim().trim_start_matches('.').to_lowercase();
    if domain.is_empty() {
        None
    } else {
        Some(domain)
    }
}
