//! Core data structures for Caravel.
//!
//! This module contains the foundational types used throughout Caravel:
//! - Versions and version predicates
//! - Variant definitions and values
//! - Predicates, conflict rules, and dependency requirements
//! - Recipes and resolved configurations

pub mod configuration;
pub mod conflict;
pub mod define;
pub mod predicate;
pub mod recipe;
pub mod requirement;
pub mod spec;
pub mod variant;
pub mod version;

pub use configuration::{Configuration, ConfigurationError};
pub use conflict::ConflictRule;
pub use define::{DefineRule, DefineValue, DirEntry, DirLayout};
pub use predicate::{Conjunction, DepVariantMatch, MatchState, Predicate, VariantMatch};
pub use recipe::{Recipe, RecipeBuilder, RecipeError};
pub use requirement::{DepVersionReq, DependencyRequest, DependencyRequirement};
pub use spec::{ConfigSpec, RawAssignment, SpecParseError};
pub use variant::{VariantDef, VariantKind, VariantValue};
pub use version::{PackageVersion, VersionPredicate};
