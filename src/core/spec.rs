//! User-facing configuration spec strings.
//!
//! A spec selects a package, optionally a version, and a partial variant
//! assignment:
//!
//! ```text
//! palace@0.13.0 +cuda ~strumpack cuda_arch=80,90 build_type=Release
//! ```
//!
//! The package name and version are optional; variant clauses may appear in
//! any order. Value clauses stay raw text here and are coerced against the
//! recipe's variant definitions when the full [`Configuration`] is built.
//!
//! [`Configuration`]: crate::core::configuration::Configuration

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::core::version::PackageVersion;

/// A raw variant assignment from a spec string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawAssignment {
    /// `+name` / `~name`
    Toggle { name: String, enabled: bool },

    /// `name=text`, coerced against the variant definition later
    Text { name: String, text: String },
}

impl RawAssignment {
    /// The variant name this assignment targets.
    pub fn name(&self) -> &str {
        match self {
            RawAssignment::Toggle { name, .. } => name,
            RawAssignment::Text { name, .. } => name,
        }
    }
}

impl fmt::Display for RawAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawAssignment::Toggle { name, enabled: true } => write!(f, "+{}", name),
            RawAssignment::Toggle { name, enabled: false } => write!(f, "~{}", name),
            RawAssignment::Text { name, text } => write!(f, "{}={}", name, text),
        }
    }
}

/// A parsed configuration spec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSpec {
    /// Package name, if given
    pub package: Option<String>,

    /// Selected version, if given
    pub version: Option<PackageVersion>,

    /// Variant assignments in order of appearance
    pub assignments: Vec<RawAssignment>,
}

/// Error returned when parsing an invalid spec string.
#[derive(Debug, Clone, Error)]
#[error("invalid spec clause `{clause}`: {reason}")]
pub struct SpecParseError {
    pub clause: String,
    pub reason: String,
}

impl SpecParseError {
    fn new(clause: &str, reason: impl Into<String>) -> Self {
        SpecParseError {
            clause: clause.to_string(),
            reason: reason.into(),
        }
    }
}

impl FromStr for ConfigSpec {
    type Err = SpecParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut spec = ConfigSpec::default();

        for (i, token) in s.split_whitespace().enumerate() {
            if let Some(name) = token.strip_prefix('+') {
                check_name(token, name)?;
                spec.assignments.push(RawAssignment::Toggle {
                    name: name.to_string(),
                    enabled: true,
                });
            } else if let Some(name) = token.strip_prefix('~') {
                check_name(token, name)?;
                spec.assignments.push(RawAssignment::Toggle {
                    name: name.to_string(),
                    enabled: false,
                });
            } else if let Some((name, value)) = token.split_once('=') {
                check_name(token, name)?;
                if value.is_empty() {
                    return Err(SpecParseError::new(token, "empty value"));
                }
                spec.assignments.push(RawAssignment::Text {
                    name: name.to_string(),
                    text: value.to_string(),
                });
            } else if let Some(rest) = token.strip_prefix('@') {
                // Bare `@version` attaches to an anonymous package
                set_version(&mut spec, token, rest)?;
            } else {
                // `name` or `name@version` — only valid as the first token
                if i != 0 {
                    return Err(SpecParseError::new(
                        token,
                        "package name must come first",
                    ));
                }
                let (name, version) = match token.split_once('@') {
                    Some((name, version)) => (name, Some(version)),
                    None => (token, None),
                };
                check_name(token, name)?;
                spec.package = Some(name.to_string());
                if let Some(version) = version {
                    set_version(&mut spec, token, version)?;
                }
            }
        }

        Ok(spec)
    }
}

fn set_version(spec: &mut ConfigSpec, token: &str, text: &str) -> Result<(), SpecParseError> {
    if spec.version.is_some() {
        return Err(SpecParseError::new(token, "duplicate version"));
    }
    let version = text
        .parse()
        .map_err(|e: crate::core::version::VersionParseError| {
            SpecParseError::new(token, e.to_string())
        })?;
    spec.version = Some(version);
    Ok(())
}

fn check_name(token: &str, name: &str) -> Result<(), SpecParseError> {
    if name.is_empty() {
        return Err(SpecParseError::new(token, "empty name"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(SpecParseError::new(token, "invalid name character"));
    }
    Ok(())
}

impl fmt::Display for ConfigSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        if let Some(ref package) = self.package {
            write!(f, "{}", package)?;
            if let Some(ref version) = self.version {
                write!(f, "@{}", version)?;
            }
            first = false;
        } else if let Some(ref version) = self.version {
            write!(f, "@{}", version)?;
            first = false;
        }
        for assignment in &self.assignments {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}", assignment)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_spec() {
        let spec: ConfigSpec = "palace@0.13.0 +cuda ~strumpack cuda_arch=80,90"
            .parse()
            .unwrap();
        assert_eq!(spec.package.as_deref(), Some("palace"));
        assert_eq!(spec.version, Some(PackageVersion::release(0, 13, 0)));
        assert_eq!(spec.assignments.len(), 3);
    }

    #[test]
    fn test_parse_bare_variants() {
        let spec: ConfigSpec = "+int64 ~shared".parse().unwrap();
        assert!(spec.package.is_none());
        assert!(spec.version.is_none());
        assert_eq!(spec.assignments.len(), 2);
    }

    #[test]
    fn test_parse_named_version() {
        let spec: ConfigSpec = "palace@develop".parse().unwrap();
        assert_eq!(spec.version, Some(PackageVersion::named("develop")));
    }

    #[test]
    fn test_parse_detached_version() {
        let spec: ConfigSpec = "@0.12 +mumps".parse().unwrap();
        assert_eq!(spec.version, Some(PackageVersion::release(0, 12, 0)));
    }

    #[test]
    fn test_package_name_must_come_first() {
        assert!("+cuda palace".parse::<ConfigSpec>().is_err());
    }

    #[test]
    fn test_duplicate_version_rejected() {
        assert!("palace@0.13.0 @0.12.0".parse::<ConfigSpec>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let text = "palace@0.13.0 +cuda ~strumpack cuda_arch=80,90";
        let spec: ConfigSpec = text.parse().unwrap();
        assert_eq!(spec.to_string(), text);
    }
}
