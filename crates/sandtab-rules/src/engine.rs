//! Rule engine seam
//!
//! The host's engine applies rules to outgoing requests. It does not offer an
//! atomic replace, so callers remove a rule id before adding it again.

use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;

use sandtab_session::ContextId;

use crate::error::RulesError;
use crate::rule::HeaderRule;
use crate::Result;

pub trait RuleEngine: Send + Sync {
    /// Add a rule. Fails if a rule with the same id is already installed.
    fn install(&self, rule: HeaderRule) -> Result<()>;

    /// Remove a rule by id. Removing an absent id is not an error.
    fn remove(&self, id: ContextId) -> Result<()>;
}

/// Rule engine that keeps rules in memory and records every removal
#[derive(Default)]
pub struct InMemoryRuleEngine {
    rules: Arc<RwLock<BTreeMap<ContextId, HeaderRule>>>,
    removals: Arc<Mutex<Vec<ContextId>>>,
}

impl InMemoryRuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(&self, id: ContextId) -> Option<HeaderRule> {
        self.rules.read().get(&id).cloned()
    }

    pub fn rules(&self) -> Vec<HeaderRule> {
        self.rules.read().values().cloned().collect()
    }

    /// Ids passed to `remove`, in call order
    pub fn removals(&self) -> Vec<ContextId> {
        self.removals.lock().clone()
    }

    pub fn removal_count(&self, id: ContextId) -> usize {
        self.removals.lock().iter().filter(|r| **r == id).count()
    }
}

impl RuleEngine for InMemoryRuleEngine {
    fn install(&self, rule: HeaderRule) -> Result<()> {
        let mut rules = self.rules.write();
        if rules.contains_key(&rule.id) {
            return Err(RulesError::Engine(format!(
                "Rule with id {} already exists",
                rule.id
            )));
        }
        rules.insert(rule.id, rule);
        Ok(())
    }

    fn remove(&self, id: ContextId) -> Result<()> {
        self.removals.lock().push(id);
        self.rules.write().remove(&id);
        Ok(())
    }
}

impl Clone for InMemoryRuleEngine {
    fn clone(&self) -> Self {
        Self {
            rules: Arc::clone(&self.rules),
            removals: Arc::clone(&self.removals),
        }
    }
}
