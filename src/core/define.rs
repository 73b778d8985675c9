//! Build-definition rules.
//!
//! The flag translator is table-driven: a recipe carries an ordered list of
//! [`DefineRule`]s plus version-dispatched [`DirLayout`]s, and translation
//! walks the tables in declaration order. Keeping the rules as data keeps
//! the output ordering reproducible and lets external recipes declare their
//! own flag tables in TOML.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::predicate::Predicate;
use crate::core::version::VersionPredicate;

/// A value for a build definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefineValue {
    /// Rendered as ON/OFF
    Bool(bool),

    /// Rendered verbatim
    Text(String),

    /// Rendered as a semicolon-separated list (CMake style)
    List(Vec<String>),
}

impl DefineValue {
    /// Render the value the way the native build tool expects it.
    pub fn render(&self) -> String {
        match self {
            DefineValue::Bool(true) => "ON".to_string(),
            DefineValue::Bool(false) => "OFF".to_string(),
            DefineValue::Text(s) => s.clone(),
            DefineValue::List(items) => items.join(";"),
        }
    }
}

impl fmt::Display for DefineValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl From<bool> for DefineValue {
    fn from(b: bool) -> Self {
        DefineValue::Bool(b)
    }
}

impl From<&str> for DefineValue {
    fn from(s: &str) -> Self {
        DefineValue::Text(s.to_string())
    }
}

impl From<String> for DefineValue {
    fn from(s: String) -> Self {
        DefineValue::Text(s)
    }
}

/// One entry in the recipe's ordered flag table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "kebab-case")]
pub enum DefineRule {
    /// `key` from a variant's value: toggles become ON/OFF, choices render
    /// verbatim, token sets join with semicolons. A variant absent at the
    /// selected version renders as OFF.
    FromVariant {
        key: String,
        variant: String,
        #[serde(default, skip_serializing_if = "Predicate::is_always")]
        when: Predicate,
    },

    /// Fixed key/value.
    Set {
        key: String,
        value: DefineValue,
        #[serde(default, skip_serializing_if = "Predicate::is_always")]
        when: Predicate,
    },

    /// Architecture token list gated on an accelerator toggle. Emitted only
    /// when `gate` is enabled; an enabled gate with an empty token set is a
    /// missing-required-option error.
    ArchList {
        key: String,
        variant: String,
        gate: String,
    },

    /// Semicolon-joined library list of a resolved dependency.
    DepLibraries {
        key: String,
        package: String,
        #[serde(default, skip_serializing_if = "Predicate::is_always")]
        when: Predicate,
    },
}

impl DefineRule {
    /// The definition key this rule produces.
    pub fn key(&self) -> &str {
        match self {
            DefineRule::FromVariant { key, .. }
            | DefineRule::Set { key, .. }
            | DefineRule::ArchList { key, .. }
            | DefineRule::DepLibraries { key, .. } => key,
        }
    }
}

/// A dependency-directory definition within a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Definition key (`LIBXSMM_DIR`)
    pub key: String,

    /// Package whose install prefix supplies the value
    pub package: String,

    /// Applicability predicate
    #[serde(default, skip_serializing_if = "Predicate::is_always")]
    pub when: Predicate,
}

/// Version-dispatched dependency-directory table.
///
/// Exactly the "which versions take their dependency directories from
/// where" policy: each layout names a version range and the directory
/// entries to emit within it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirLayout {
    /// Versions this layout applies to
    pub when: VersionPredicate,

    /// Entries emitted in declaration order
    pub entries: Vec<DirEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_values() {
        assert_eq!(DefineValue::Bool(true).render(), "ON");
        assert_eq!(DefineValue::Bool(false).render(), "OFF");
        assert_eq!(DefineValue::Text("Release".into()).render(), "Release");
        assert_eq!(
            DefineValue::List(vec!["LAPACK".into(), "BLAS".into()]).render(),
            "LAPACK;BLAS"
        );
    }

    #[test]
    fn test_rule_toml_round_trip() {
        let toml_src = r#"
            rule = "from-variant"
            key = "BUILD_SHARED_LIBS"
            variant = "shared"
        "#;
        let rule: DefineRule = toml::from_str(toml_src).unwrap();
        assert_eq!(rule.key(), "BUILD_SHARED_LIBS");
        assert!(matches!(rule, DefineRule::FromVariant { .. }));
    }
}
