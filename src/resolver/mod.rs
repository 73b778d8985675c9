//! Constraint evaluation.
//!
//! The evaluator is pure and deterministic: all rule tables are static
//! recipe data, and validation is a function of (recipe, configuration,
//! installed-package metadata) with no I/O of its own.

pub mod errors;
pub mod evaluate;
pub mod requirements;

pub use errors::{ConfigError, ValidationFailure, Violation};
pub use evaluate::validate;
pub use requirements::requirements;
