//! Package versions and version predicates.
//!
//! Recipes reference two kinds of versions: released semver versions
//! (`0.13.0`) and named development versions (`develop`, tracking a branch).
//! Named versions order above every release, so an upper-unbounded
//! requirement like `>=0.14` accepts them while `<0.14.0` does not.

use std::fmt;
use std::str::FromStr;

use semver::{Comparator, Op, Version, VersionReq};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A selected or declared package version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PackageVersion {
    /// A released version (`0.13.0`).
    Release(Version),

    /// A development version tracking a branch (`develop`).
    Named(String),
}

impl PackageVersion {
    /// Create a release version.
    pub fn release(major: u64, minor: u64, patch: u64) -> Self {
        PackageVersion::Release(Version::new(major, minor, patch))
    }

    /// Create a named development version.
    pub fn named(name: impl Into<String>) -> Self {
        PackageVersion::Named(name.into())
    }

    /// Get the release version, if this is one.
    pub fn as_release(&self) -> Option<&Version> {
        match self {
            PackageVersion::Release(v) => Some(v),
            PackageVersion::Named(_) => None,
        }
    }

    /// Check if this is a named development version.
    pub fn is_named(&self) -> bool {
        matches!(self, PackageVersion::Named(_))
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageVersion::Release(v) => write!(f, "{}", v),
            PackageVersion::Named(name) => write!(f, "{}", name),
        }
    }
}

impl From<PackageVersion> for String {
    fn from(v: PackageVersion) -> String {
        v.to_string()
    }
}

impl TryFrom<String> for PackageVersion {
    type Error = VersionParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Error returned when parsing an invalid version.
#[derive(Debug, Clone, Error)]
#[error("invalid version `{0}`")]
pub struct VersionParseError(pub String);

impl FromStr for PackageVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(VersionParseError(s.to_string()));
        }

        if s.starts_with(|c: char| c.is_ascii_digit()) {
            parse_version_lenient(s)
                .map(PackageVersion::Release)
                .ok_or_else(|| VersionParseError(s.to_string()))
        } else {
            // Branch names: restrict to identifier-ish characters
            if s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.') {
                Ok(PackageVersion::Named(s.to_string()))
            } else {
                Err(VersionParseError(s.to_string()))
            }
        }
    }
}

/// Parse a version string, allowing for incomplete versions.
pub fn parse_version_lenient(s: &str) -> Option<Version> {
    // Try exact parse first
    if let Ok(v) = s.parse() {
        return Some(v);
    }

    // Try adding missing components
    let parts: Vec<&str> = s.split('.').collect();
    match parts.len() {
        1 => {
            let major: u64 = parts[0].parse().ok()?;
            Some(Version::new(major, 0, 0))
        }
        2 => {
            let major: u64 = parts[0].parse().ok()?;
            let minor: u64 = parts[1].parse().ok()?;
            Some(Version::new(major, minor, 0))
        }
        _ => None,
    }
}

/// A version requirement evaluated against a [`PackageVersion`].
///
/// Wraps a semver requirement. Named development versions satisfy a
/// predicate only when it has no upper bound, since they track the newest
/// state of the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct VersionPredicate {
    req: VersionReq,
}

impl VersionPredicate {
    /// The predicate that matches every version.
    pub fn any() -> Self {
        VersionPredicate {
            req: VersionReq::STAR,
        }
    }

    /// Parse a predicate from a semver requirement string (`>=0.14`, `<0.14.0`).
    pub fn parse(s: &str) -> Result<Self, VersionParseError> {
        let req = VersionReq::parse(s).map_err(|_| VersionParseError(s.to_string()))?;
        Ok(VersionPredicate { req })
    }

    /// Check whether a version satisfies this predicate.
    pub fn matches(&self, version: &PackageVersion) -> bool {
        match version {
            PackageVersion::Release(v) => self.req.matches(v),
            PackageVersion::Named(_) => self.accepts_unbounded(),
        }
    }

    /// Check if this predicate matches everything.
    pub fn is_any(&self) -> bool {
        self.req == VersionReq::STAR
    }

    /// A predicate with only lower bounds accepts development versions.
    fn accepts_unbounded(&self) -> bool {
        self.req.comparators.iter().all(is_lower_bound)
    }
}

fn is_lower_bound(comp: &Comparator) -> bool {
    matches!(comp.op, Op::Greater | Op::GreaterEq)
}

impl fmt::Display for VersionPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.req)
    }
}

impl From<VersionPredicate> for String {
    fn from(p: VersionPredicate) -> String {
        p.to_string()
    }
}

impl TryFrom<String> for VersionPredicate {
    type Error = VersionParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        VersionPredicate::parse(&s)
    }
}

impl FromStr for VersionPredicate {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionPredicate::parse(s)
    }
}
