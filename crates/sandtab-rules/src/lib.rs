//! Sandtab Header Rules
//!
//! A context's captured credentials are replayed through one outbound rule
//! that sets the `Cookie` header on the context's main-document requests.
//! The rule id is the context id; there is never more than one per context.

mod engine;
mod error;
mod projector;
mod rule;

pub use engine::{InMemoryRuleEngine, RuleEngine};
pub use error::RulesError;
pub use projector::{HeaderRuleProjector, Projection};
pub use rule::{
    ActionType, HeaderModification, HeaderOperation, HeaderRule, ResourceType, RuleAction,
    RuleCondition, COOKIE_HEADER,
};

pub type Result<T> = std::result::Result<T, RulesError>;
