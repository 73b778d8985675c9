//! The constraint evaluator.
//!
//! Validates a configuration against its recipe's conflict table. Every
//! rule is evaluated; all matching rules are reported together. Rules
//! conditioned on a dependency's own variant (`^mumps+int64`) resolve that
//! dependency's configuration transitively: sub-variant pins derived from
//! this recipe's requirements first, installed-package metadata second, and
//! an unresolvable-variant error when neither can answer.

use crate::core::configuration::Configuration;
use crate::core::predicate::Conjunction;
use crate::core::recipe::Recipe;
use crate::core::requirement::DependencyRequest;
use crate::core::variant::VariantValue;
use crate::registry::{PackageResolver, RegistryError};
use crate::resolver::errors::{ConfigError, ValidationFailure, Violation};
use crate::resolver::requirements::requirements;

/// Validate a configuration against its recipe.
///
/// Returns `Ok(())` for a valid configuration. All violated conflict rules
/// come back in one [`ConfigError::UnsatisfiedConflict`]; a dependency
/// variant that cannot be derived surfaces as
/// [`ConfigError::UnresolvableDependency`] only when no rule is otherwise
/// violated, so conflicts the user can already fix are never hidden.
pub fn validate(
    recipe: &Recipe,
    config: &Configuration,
    resolver: &dyn PackageResolver,
) -> Result<(), ConfigError> {
    let requests = requirements(recipe, config);

    let mut violations = Vec::new();
    let mut lookup_failure = None;

    for rule in recipe.conflicts() {
        for conj in &rule.when.any {
            match conjunction_matches(conj, config, &requests, resolver) {
                Ok(true) => {
                    tracing::debug!("conflict rule matched: {}", conj);
                    violations.push(Violation {
                        matched: conj.to_string(),
                        message: rule.message.clone(),
                    });
                    break;
                }
                Ok(false) => {}
                Err(err) => {
                    if lookup_failure.is_none() {
                        lookup_failure = Some(err);
                    }
                }
            }
        }
    }

    if !violations.is_empty() {
        return Err(ConfigError::UnsatisfiedConflict(ValidationFailure {
            violations,
        }));
    }
    if let Some(err) = lookup_failure {
        return Err(err);
    }
    Ok(())
}

/// Evaluate one conjunction, including its dependency-variant matchers.
fn conjunction_matches(
    conj: &Conjunction,
    config: &Configuration,
    requests: &[DependencyRequest],
    resolver: &dyn PackageResolver,
) -> Result<bool, ConfigError> {
    if !conj.matches_config(config) {
        return Ok(false);
    }

    for matcher in &conj.deps {
        // A dependency outside the derived graph cannot trip the rule
        match dep_variant(requests, resolver, &matcher.package, &matcher.variant)? {
            None => return Ok(false),
            Some(value) => {
                if !matcher.matches_value(&value) {
                    return Ok(false);
                }
            }
        }
    }

    Ok(true)
}

/// Transitive lookup of a dependency's variant value.
///
/// Returns `None` when the package is not part of the derived dependency
/// set. For packages that are, the value comes from our own pinned or
/// forwarded sub-variants, then from installed metadata.
fn dep_variant(
    requests: &[DependencyRequest],
    resolver: &dyn PackageResolver,
    package: &str,
    variant: &str,
) -> Result<Option<VariantValue>, ConfigError> {
    let Some(request) = requests.iter().find(|r| r.package == package) else {
        return Ok(None);
    };

    if let Some(value) = request.variant(variant) {
        return Ok(Some(value.clone()));
    }

    match resolver.resolve(package, request.version.as_ref()) {
        Ok(installed) => match installed.variant(variant) {
            Some(value) => Ok(Some(value.clone())),
            None => Err(ConfigError::UnresolvableDependency {
                package: package.to_string(),
                detail: format!(
                    "cannot determine variant `{}`: not recorded in installed metadata",
                    variant
                ),
            }),
        },
        Err(RegistryError::NotFound { .. }) => Err(ConfigError::UnresolvableDependency {
            package: package.to_string(),
            detail: format!(
                "cannot determine variant `{}`: package is not registered",
                variant
            ),
        }),
        Err(err) => Err(err.into()),
    }
}
