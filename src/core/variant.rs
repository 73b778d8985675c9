//! Variant definitions and values.
//!
//! A variant is a named build-time configuration toggle. Most are boolean
//! (`+shared` / `~shared`); some carry a set of tokens (GPU architectures)
//! or a single choice from a fixed list (the build type).

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::version::VersionPredicate;

/// The sentinel token meaning "no value selected" for multi-token variants.
pub const NONE_TOKEN: &str = "none";

/// A resolved variant value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariantValue {
    /// Boolean toggle.
    Bool(bool),

    /// Single choice from an enumerated list.
    Choice(String),

    /// Set of tokens; empty means none selected.
    Tokens(BTreeSet<String>),
}

impl VariantValue {
    /// Create a token-set value from an iterator.
    pub fn tokens<I, S>(iter: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        VariantValue::Tokens(iter.into_iter().map(Into::into).collect())
    }

    /// Get the boolean value, if this is a toggle.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            VariantValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the choice string, if this is an enumerated value.
    pub fn as_choice(&self) -> Option<&str> {
        match self {
            VariantValue::Choice(s) => Some(s),
            _ => None,
        }
    }

    /// Get the token set, if this is a multi-token value.
    pub fn as_tokens(&self) -> Option<&BTreeSet<String>> {
        match self {
            VariantValue::Tokens(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for VariantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantValue::Bool(true) => write!(f, "on"),
            VariantValue::Bool(false) => write!(f, "off"),
            VariantValue::Choice(s) => write!(f, "{}", s),
            VariantValue::Tokens(t) if t.is_empty() => write!(f, "{}", NONE_TOKEN),
            VariantValue::Tokens(t) => {
                let joined: Vec<&str> = t.iter().map(String::as_str).collect();
                write!(f, "{}", joined.join(","))
            }
        }
    }
}

/// The shape of a variant: what values it admits and its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum VariantKind {
    /// Boolean toggle with a default.
    Bool { default: bool },

    /// Set of free-form tokens, defaulting to none selected.
    Multi {
        #[serde(default)]
        default: BTreeSet<String>,
    },

    /// Single choice from a fixed list.
    Choice { values: Vec<String>, default: String },
}

impl VariantKind {
    /// The default value for this variant kind.
    pub fn default_value(&self) -> VariantValue {
        match self {
            VariantKind::Bool { default } => VariantValue::Bool(*default),
            VariantKind::Multi { default } => VariantValue::Tokens(default.clone()),
            VariantKind::Choice { default, .. } => VariantValue::Choice(default.clone()),
        }
    }
}

/// A variant declaration in a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDef {
    /// Variant name (`shared`, `cuda_arch`, ...)
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Admitted values and default
    #[serde(flatten)]
    pub kind: VariantKind,

    /// Versions this variant applies to (all versions if absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<VersionPredicate>,
}

impl VariantDef {
    /// Declare a boolean variant.
    pub fn boolean(name: impl Into<String>, default: bool, description: impl Into<String>) -> Self {
        VariantDef {
            name: name.into(),
            description: description.into(),
            kind: VariantKind::Bool { default },
            when: None,
        }
    }

    /// Declare a multi-token variant defaulting to none selected.
    pub fn multi(name: impl Into<String>, description: impl Into<String>) -> Self {
        VariantDef {
            name: name.into(),
            description: description.into(),
            kind: VariantKind::Multi {
                default: BTreeSet::new(),
            },
            when: None,
        }
    }

    /// Declare an enumerated single-choice variant.
    pub fn choice<I, S>(
        name: impl Into<String>,
        values: I,
        default: impl Into<String>,
        description: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        VariantDef {
            name: name.into(),
            description: description.into(),
            kind: VariantKind::Choice {
                values: values.into_iter().map(Into::into).collect(),
                default: default.into(),
            },
            when: None,
        }
    }

    /// Restrict this variant to a version range.
    pub fn only_when(mut self, when: VersionPredicate) -> Self {
        self.when = Some(when);
        self
    }

    /// Check a value against this definition.
    pub fn accepts(&self, value: &VariantValue) -> Result<(), VariantValueError> {
        match (&self.kind, value) {
            (VariantKind::Bool { .. }, VariantValue::Bool(_)) => Ok(()),
            (VariantKind::Multi { .. }, VariantValue::Tokens(_)) => Ok(()),
            (VariantKind::Choice { values, .. }, VariantValue::Choice(c)) => {
                if values.iter().any(|v| v == c) {
                    Ok(())
                } else {
                    Err(VariantValueError::InvalidChoice {
                        variant: self.name.clone(),
                        value: c.clone(),
                        allowed: values.clone(),
                    })
                }
            }
            _ => Err(VariantValueError::WrongShape {
                variant: self.name.clone(),
                value: value.to_string(),
            }),
        }
    }

    /// Coerce a raw text assignment (`cuda_arch=80,90`, `build_type=Debug`)
    /// into a value for this variant.
    pub fn coerce_text(&self, text: &str) -> Result<VariantValue, VariantValueError> {
        match &self.kind {
            VariantKind::Bool { .. } => match text {
                "true" | "on" => Ok(VariantValue::Bool(true)),
                "false" | "off" => Ok(VariantValue::Bool(false)),
                _ => Err(VariantValueError::WrongShape {
                    variant: self.name.clone(),
                    value: text.to_string(),
                }),
            },
            VariantKind::Multi { .. } => {
                if text == NONE_TOKEN {
                    return Ok(VariantValue::Tokens(BTreeSet::new()));
                }
                let tokens: BTreeSet<String> = text
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect();
                Ok(VariantValue::Tokens(tokens))
            }
            VariantKind::Choice { .. } => {
                let value = VariantValue::Choice(text.to_string());
                self.accepts(&value)?;
                Ok(value)
            }
        }
    }
}

/// Error returned when a value does not fit a variant definition.
#[derive(Debug, Clone, Error)]
pub enum VariantValueError {
    #[error("variant `{variant}` does not accept `{value}`")]
    WrongShape { variant: String, value: String },

    #[error("variant `{variant}` does not accept `{value}`, valid values: {}", allowed.join(", "))]
    InvalidChoice {
        variant: String,
        value: String,
        allowed: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_default() {
        let def = VariantDef::boolean("shared", true, "Build shared libraries");
        assert_eq!(def.kind.default_value(), VariantValue::Bool(true));
    }

    #[test]
    fn test_multi_coerce() {
        let def = VariantDef::multi("cuda_arch", "CUDA architectures");
        let value = def.coerce_text("80,90").unwrap();
        assert_eq!(value, VariantValue::tokens(["80", "90"]));
    }

    #[test]
    fn test_multi_none_sentinel() {
        let def = VariantDef::multi("cuda_arch", "CUDA architectures");
        let value = def.coerce_text("none").unwrap();
        assert_eq!(value, VariantValue::Tokens(BTreeSet::new()));
    }

    #[test]
    fn test_choice_rejects_unknown() {
        let def = VariantDef::choice(
            "build_type",
            ["Debug", "Release", "RelWithDebInfo"],
            "RelWithDebInfo",
            "CMake build type",
        );
        assert!(def.coerce_text("Release").is_ok());
        let err = def.coerce_text("Profile").unwrap_err();
        assert!(err.to_string().contains("valid values"));
    }

    #[test]
    fn test_tokens_display() {
        assert_eq!(VariantValue::tokens(["90", "80"]).to_string(), "80,90");
        assert_eq!(VariantValue::Tokens(BTreeSet::new()).to_string(), "none");
    }

    #[test]
    fn test_accepts_shape_mismatch() {
        let def = VariantDef::boolean("shared", true, "");
        assert!(def.accepts(&VariantValue::Choice("on".into())).is_err());
    }
}
