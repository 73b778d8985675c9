//! Conflict rules.
//!
//! A conflict rule is a predicate whose truth invalidates a configuration,
//! paired with the message shown to the user. Rules live in a flat table on
//! the recipe and are evaluated against an immutable configuration; the
//! evaluator reports every matching rule, not just the first.

use serde::{Deserialize, Serialize};

use crate::core::predicate::Predicate;

/// A predicate that, when matched, invalidates the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRule {
    /// The invalidating condition
    pub when: Predicate,

    /// Human-readable reason shown to the user
    pub message: String,
}

impl ConflictRule {
    /// Create a conflict rule.
    pub fn new(when: Predicate, message: impl Into<String>) -> Self {
        ConflictRule {
            when,
            message: message.into(),
        }
    }
}
