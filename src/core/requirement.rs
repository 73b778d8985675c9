//! Conditional dependency requirements.
//!
//! A recipe declares what it needs from other packages under which
//! conditions: pinned sub-variants (`mumps+metis+parmetis`), sub-variants
//! forwarded from the parent configuration (`superlu-dist` inherits
//! `shared`, `int64`, `openmp`), and pins that apply only under a predicate
//! (`libceed+magma` when a GPU backend is on). Resolving a requirement
//! against a configuration yields a concrete [`DependencyRequest`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::configuration::Configuration;
use crate::core::predicate::Predicate;
use crate::core::variant::VariantValue;
use crate::core::version::{PackageVersion, VersionParseError, VersionPredicate};

/// A version constraint on a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DepVersionReq {
    /// Satisfied by versions in a semver range (`>=3.21`).
    Range(VersionPredicate),

    /// Satisfied only by one exact version, possibly named (`=main`, `develop`).
    Exactly(PackageVersion),
}

impl DepVersionReq {
    /// Check a version against this constraint.
    pub fn matches(&self, version: &PackageVersion) -> bool {
        match self {
            DepVersionReq::Range(pred) => pred.matches(version),
            DepVersionReq::Exactly(v) => v == version,
        }
    }
}

impl fmt::Display for DepVersionReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepVersionReq::Range(pred) => write!(f, "{}", pred),
            DepVersionReq::Exactly(v) => write!(f, "={}", v),
        }
    }
}

impl FromStr for DepVersionReq {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // `=name` or a bare branch name pins an exact version; anything with
        // comparator syntax is a range.
        if let Some(rest) = s.strip_prefix('=') {
            if rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
                return Ok(DepVersionReq::Exactly(rest.parse()?));
            }
            return Ok(DepVersionReq::Range(VersionPredicate::parse(s)?));
        }
        if s.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Ok(DepVersionReq::Exactly(s.parse()?));
        }
        Ok(DepVersionReq::Range(VersionPredicate::parse(s)?))
    }
}

impl From<DepVersionReq> for String {
    fn from(r: DepVersionReq) -> String {
        r.to_string()
    }
}

impl TryFrom<String> for DepVersionReq {
    type Error = VersionParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A sub-variant pinned to a fixed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantPin {
    pub variant: String,
    pub value: VariantValue,
}

/// A sub-variant copied from the parent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forward {
    /// Parent variant to read
    pub parent: String,

    /// Dependency variant to set (usually the same name)
    pub variant: String,
}

/// A pin that applies only when a predicate holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalPin {
    pub when: Predicate,
    pub variant: String,
    pub value: VariantValue,
}

/// A conditional dependency declaration in a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRequirement {
    /// Target package name
    pub package: String,

    /// Version constraint, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<DepVersionReq>,

    /// Applicability predicate; always applies when empty
    #[serde(default, skip_serializing_if = "Predicate::is_always")]
    pub when: Predicate,

    /// Fixed sub-variant pins
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pins: Vec<VariantPin>,

    /// Sub-variants copied from the parent configuration
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forwards: Vec<Forward>,

    /// Pins applied only under a predicate
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditional_pins: Vec<ConditionalPin>,

    /// Needed at build time only (compilers, cmake, pkgconfig)
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub build_only: bool,
}

impl DependencyRequirement {
    /// Declare a requirement on a package.
    pub fn new(package: impl Into<String>) -> Self {
        DependencyRequirement {
            package: package.into(),
            version: None,
            when: Predicate::always(),
            pins: Vec::new(),
            forwards: Vec::new(),
            conditional_pins: Vec::new(),
            build_only: false,
        }
    }

    /// Constrain the dependency's version.
    pub fn version(mut self, req: DepVersionReq) -> Self {
        self.version = Some(req);
        self
    }

    /// Restrict this requirement to configurations matching a predicate.
    pub fn when(mut self, when: Predicate) -> Self {
        self.when = when;
        self
    }

    /// Pin a boolean sub-variant.
    pub fn pin(mut self, variant: impl Into<String>, enabled: bool) -> Self {
        self.pins.push(VariantPin {
            variant: variant.into(),
            value: VariantValue::Bool(enabled),
        });
        self
    }

    /// Pin a sub-variant to an arbitrary value.
    pub fn pin_value(mut self, variant: impl Into<String>, value: VariantValue) -> Self {
        self.pins.push(VariantPin {
            variant: variant.into(),
            value,
        });
        self
    }

    /// Copy a parent variant onto the dependency under the same name.
    pub fn forward(mut self, variant: impl Into<String>) -> Self {
        let variant = variant.into();
        self.forwards.push(Forward {
            parent: variant.clone(),
            variant,
        });
        self
    }

    /// Copy a parent variant onto the dependency under another name.
    pub fn forward_as(mut self, parent: impl Into<String>, variant: impl Into<String>) -> Self {
        self.forwards.push(Forward {
            parent: parent.into(),
            variant: variant.into(),
        });
        self
    }

    /// Pin a boolean sub-variant only when a predicate holds.
    pub fn pin_when(mut self, when: Predicate, variant: impl Into<String>, enabled: bool) -> Self {
        self.conditional_pins.push(ConditionalPin {
            when,
            variant: variant.into(),
            value: VariantValue::Bool(enabled),
        });
        self
    }

    /// Mark this as a build-time-only dependency.
    pub fn build_only(mut self) -> Self {
        self.build_only = true;
        self
    }

    /// Resolve this requirement against a configuration.
    ///
    /// Returns `None` when the requirement does not apply. Forwards of
    /// parent variants that are absent at the selected version are skipped.
    pub fn resolve(&self, config: &Configuration) -> Option<DependencyRequest> {
        if !self.when.matches_config(config) {
            return None;
        }

        let mut variants = BTreeMap::new();
        for pin in &self.pins {
            variants.insert(pin.variant.clone(), pin.value.clone());
        }
        for pin in &self.conditional_pins {
            if pin.when.matches_config(config) {
                variants.insert(pin.variant.clone(), pin.value.clone());
            }
        }
        for forward in &self.forwards {
            if let Some(value) = config.get(&forward.parent) {
                variants.insert(forward.variant.clone(), value.clone());
            }
        }

        Some(DependencyRequest {
            package: self.package.clone(),
            version: self.version.clone(),
            variants,
            build_only: self.build_only,
        })
    }
}

/// A concrete dependency request derived from a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyRequest {
    pub package: String,
    pub version: Option<DepVersionReq>,
    pub variants: BTreeMap<String, VariantValue>,
    pub build_only: bool,
}

impl DependencyRequest {
    /// Look up a pinned or forwarded sub-variant.
    pub fn variant(&self, name: &str) -> Option<&VariantValue> {
        self.variants.get(name)
    }
}

impl fmt::Display for DependencyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.package)?;
        if let Some(ref version) = self.version {
            write!(f, "@{}", version)?;
        }
        for (name, value) in &self.variants {
            match value {
                VariantValue::Bool(true) => write!(f, " +{}", name)?,
                VariantValue::Bool(false) => write!(f, " ~{}", name)?,
                other => write!(f, " {}={}", name, other)?,
            }
        }
        if self.build_only {
            write!(f, " (build)")?;
        }
        Ok(())
    }
}
