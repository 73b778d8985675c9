//! Resolved configurations.
//!
//! A [`Configuration`] is a fully-resolved assignment of every applicable
//! variant plus a selected version. It is built once from a recipe and a
//! user spec, validated by the constraint evaluator, consumed by the flag
//! translator, and then discarded. Nothing mutates it after construction.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::core::recipe::Recipe;
use crate::core::spec::{ConfigSpec, RawAssignment};
use crate::core::variant::{VariantValue, VariantValueError};
use crate::core::version::PackageVersion;

/// A fully-resolved configuration for one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Configuration {
    package: String,
    version: PackageVersion,
    variants: BTreeMap<String, VariantValue>,
}

impl Configuration {
    /// Build a configuration from recipe defaults and a user spec.
    ///
    /// Defaults are taken for every variant applicable at the selected
    /// version; assignments from the spec override them. Variants that do
    /// not apply at the selected version are absent from the result, and
    /// explicitly assigning one is an error.
    pub fn from_spec(recipe: &Recipe, spec: &ConfigSpec) -> Result<Self, ConfigurationError> {
        if let Some(ref requested) = spec.package {
            if requested != recipe.name() {
                return Err(ConfigurationError::PackageMismatch {
                    requested: requested.clone(),
                    recipe: recipe.name().to_string(),
                });
            }
        }

        let version = match spec.version.clone() {
            Some(version) => version,
            None => recipe.default_version().clone(),
        };

        // Named versions must be declared; unlisted releases are accepted
        // so specs can reference versions newer than the recipe's list.
        if version.is_named() && !recipe.versions().contains(&version) {
            return Err(ConfigurationError::UnknownVersion {
                version: version.to_string(),
                available: recipe.versions().iter().map(|v| v.to_string()).collect(),
            });
        }
        if !version.is_named() && !recipe.versions().contains(&version) {
            tracing::warn!(
                "version {} is not declared by recipe `{}`",
                version,
                recipe.name()
            );
        }

        let mut variants = BTreeMap::new();
        for def in recipe.variants() {
            let applicable = def.when.as_ref().map_or(true, |w| w.matches(&version));
            if applicable {
                variants.insert(def.name.clone(), def.kind.default_value());
            }
        }

        for assignment in &spec.assignments {
            let name = assignment.name();
            let def = recipe.variant(name).ok_or_else(|| {
                ConfigurationError::UnknownVariant {
                    name: name.to_string(),
                    suggestions: suggest_names(name, recipe),
                }
            })?;

            if !variants.contains_key(name) {
                return Err(ConfigurationError::VariantNotApplicable {
                    name: name.to_string(),
                    version: version.to_string(),
                    when: def
                        .when
                        .as_ref()
                        .map(|w| w.to_string())
                        .unwrap_or_default(),
                });
            }

            let value = match assignment {
                RawAssignment::Toggle { enabled, .. } => {
                    let value = VariantValue::Bool(*enabled);
                    def.accepts(&value)?;
                    value
                }
                RawAssignment::Text { text, .. } => def.coerce_text(text)?,
            };
            variants.insert(name.to_string(), value);
        }

        Ok(Configuration {
            package: recipe.name().to_string(),
            version,
            variants,
        })
    }

    /// The package name.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// The selected version.
    pub fn version(&self) -> &PackageVersion {
        &self.version
    }

    /// Look up a variant value. Absent means the variant does not apply at
    /// this version.
    pub fn get(&self, name: &str) -> Option<&VariantValue> {
        self.variants.get(name)
    }

    /// Check whether a boolean variant is enabled. Absent or non-boolean
    /// variants read as disabled.
    pub fn enabled(&self, name: &str) -> bool {
        matches!(self.variants.get(name), Some(VariantValue::Bool(true)))
    }

    /// Get the token set of a multi-valued variant.
    pub fn tokens(&self, name: &str) -> Option<&std::collections::BTreeSet<String>> {
        self.variants.get(name).and_then(VariantValue::as_tokens)
    }

    /// Iterate over all resolved variants in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VariantValue)> {
        self.variants.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.package, self.version)?;
        for (name, value) in &self.variants {
            match value {
                VariantValue::Bool(true) => write!(f, " +{}", name)?,
                VariantValue::Bool(false) => write!(f, " ~{}", name)?,
                other => write!(f, " {}={}", name, other)?,
            }
        }
        Ok(())
    }
}

/// Error building a configuration from a spec.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("spec names package `{requested}` but the recipe is for `{recipe}`")]
    PackageMismatch { requested: String, recipe: String },

    #[error("unknown version `{version}`, declared versions: {}", available.join(", "))]
    UnknownVersion {
        version: String,
        available: Vec<String>,
    },

    #[error("unknown variant `{name}`")]
    UnknownVariant {
        name: String,
        suggestions: Vec<String>,
    },

    #[error("variant `{name}` does not apply to version {version} (requires {when})")]
    VariantNotApplicable {
        name: String,
        version: String,
        when: String,
    },

    #[error(transparent)]
    InvalidValue(#[from] VariantValueError),
}

/// Rough name suggestions for typos.
fn suggest_names(input: &str, recipe: &Recipe) -> Vec<String> {
    recipe
        .variants()
        .iter()
        .map(|d| d.name.clone())
        .filter(|name| {
            name.contains(input)
                || input.contains(name.as_str())
                || name.chars().next() == input.chars().next()
        })
        .take(3)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes;

    fn build(spec: &str) -> Result<Configuration, ConfigurationError> {
        let recipe = recipes::palace();
        Configuration::from_spec(&recipe, &spec.parse().unwrap())
    }

    #[test]
    fn test_defaults_applied() {
        let cfg = build("palace@0.13.0").unwrap();
        assert!(cfg.enabled("shared"));
        assert!(cfg.enabled("superlu-dist"));
        assert!(cfg.enabled("slepc"));
        assert!(!cfg.enabled("mumps"));
        assert!(!cfg.enabled("int64"));
        assert!(cfg.tokens("cuda_arch").unwrap().is_empty());
    }

    #[test]
    fn test_spec_overrides_defaults() {
        let cfg = build("palace@0.13.0 ~superlu-dist +mumps +int64").unwrap();
        assert!(!cfg.enabled("superlu-dist"));
        assert!(cfg.enabled("mumps"));
        assert!(cfg.enabled("int64"));
    }

    #[test]
    fn test_version_gated_variant_absent() {
        let cfg = build("palace@0.13.0").unwrap();
        assert!(cfg.get("sundials").is_none());

        let cfg = build("palace@0.14.0").unwrap();
        assert!(cfg.enabled("sundials"));
    }

    #[test]
    fn test_assigning_inapplicable_variant_fails() {
        let err = build("palace@0.13.0 +sundials").unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::VariantNotApplicable { .. }
        ));
    }

    #[test]
    fn test_unknown_variant_fails() {
        let err = build("palace@0.13.0 +sparkle").unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownVariant { .. }));
    }

    #[test]
    fn test_package_mismatch() {
        let recipe = recipes::palace();
        let spec = "other-solver +shared".parse().unwrap();
        let err = Configuration::from_spec(&recipe, &spec).unwrap_err();
        assert!(matches!(err, ConfigurationError::PackageMismatch { .. }));
    }

    #[test]
    fn test_unknown_named_version_rejected() {
        let err = build("palace@trunk").unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownVersion { .. }));
    }

    #[test]
    fn test_default_version_is_latest_release() {
        let cfg = build("palace").unwrap();
        assert_eq!(cfg.version(), &PackageVersion::release(0, 13, 0));
    }

    #[test]
    fn test_display_spec_like() {
        let cfg = build("palace@0.13.0 +cuda cuda_arch=80").unwrap();
        let shown = cfg.to_string();
        assert!(shown.starts_with("palace@0.13.0"));
        assert!(shown.contains("+cuda"));
        assert!(shown.contains("cuda_arch=80"));
        assert!(shown.contains("~mumps"));
    }
}
