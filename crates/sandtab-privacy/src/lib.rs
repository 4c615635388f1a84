//! Sandtab Privacy Rules
//!
//! Domains on the exclusion list are never isolated: their credentials are
//! not captured and no header rule is projected for contexts showing them.

mod exclusion;

pub use exclusion::{ExclusionList, DEFAULT_EXCLUDED_DOMAINS};
