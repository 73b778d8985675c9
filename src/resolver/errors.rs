//! Configuration error types and diagnostics.

use std::fmt;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::registry::RegistryError;
use crate::util::diagnostic::Diagnostic;

/// A single violated conflict rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The matched condition, in clause syntax
    pub matched: String,

    /// The rule's message
    pub message: String,
}

/// All conflict rules violated by a configuration.
///
/// Validation never stops at the first violated rule; the full list comes
/// back so the user can fix everything in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub violations: Vec<Violation>,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "configuration violates {} conflict rule{}",
            self.violations.len(),
            if self.violations.len() == 1 { "" } else { "s" }
        )
    }
}

/// Error validating or translating a configuration.
///
/// All of these are fatal to the configuration step: they describe static
/// misconfiguration, not transient failures, so nothing is retried.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ConfigError {
    #[error("{0}")]
    #[diagnostic(
        code(caravel::config::conflict),
        help("adjust the listed variants and re-run `caravel check`")
    )]
    UnsatisfiedConflict(ValidationFailure),

    #[error("missing required option `{variant}`: {reason}")]
    #[diagnostic(code(caravel::config::missing_option))]
    MissingRequiredOption { variant: String, reason: String },

    #[error("unresolvable dependency `{package}`: {detail}")]
    #[diagnostic(
        code(caravel::config::unresolvable),
        help("register the package in the file passed via --packages")
    )]
    UnresolvableDependency { package: String, detail: String },
}

impl ConfigError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ConfigError::UnsatisfiedConflict(failure) => {
                let mut diag = Diagnostic::error(failure.to_string());
                for violation in &failure.violations {
                    diag = diag.with_context(format!(
                        "{} (matched: {})",
                        violation.message, violation.matched
                    ));
                }
                diag.with_suggestion("Adjust the listed variants and re-run `caravel check`")
            }

            ConfigError::MissingRequiredOption { variant, reason } => {
                Diagnostic::error(format!("missing required option `{}`", variant))
                    .with_context(reason.clone())
                    .with_suggestion(format!("Set a value, e.g. `{}=80`", variant))
            }

            ConfigError::UnresolvableDependency { package, detail } => {
                Diagnostic::error(format!("unresolvable dependency `{}`", package))
                    .with_context(detail.clone())
                    .with_suggestion(format!(
                        "Register `{}` in the packages file passed via --packages",
                        package
                    ))
            }
        }
    }
}

impl From<RegistryError> for ConfigError {
    fn from(err: RegistryError) -> Self {
        let package = match &err {
            RegistryError::NotFound { package, .. } => package.clone(),
            RegistryError::VersionMismatch { package, .. } => package.clone(),
            RegistryError::ReadFailed { path, .. } => path.clone(),
            RegistryError::ParseFailed { path, .. } => path.clone(),
        };
        ConfigError::UnresolvableDependency {
            package,
            detail: err.to_string(),
        }
    }
}
