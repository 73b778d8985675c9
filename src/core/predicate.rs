//! Applicability and conflict predicates.
//!
//! A predicate is a disjunction of conjunctions over variant state, the
//! selected version, and the sub-variants of dependencies. Conjunctions are
//! written in a compact clause syntax, the same one accepted on the command
//! line:
//!
//! ```text
//! +cuda ~rocm @>=0.14 cuda_arch=none ^mumps+int64
//! ```
//!
//! `+name` matches an enabled toggle, `~name` a disabled (or inapplicable)
//! one, `name=value` an enumerated or token value (`=none` matches an empty
//! token set), `@req` a version range, and `^dep+name` / `^dep~name` the
//! toggle state of a dependency's own variant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::configuration::Configuration;
use crate::core::variant::{VariantValue, NONE_TOKEN};
use crate::core::version::VersionPredicate;

/// How a variant's state is matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchState {
    /// Toggle enabled (`+name`)
    Enabled,
    /// Toggle disabled or not applicable (`~name`)
    Disabled,
    /// Enumerated value equals, or token set contains; `none` matches an
    /// empty token set (`name=value`)
    Equals(String),
}

/// A matcher against one of the package's own variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantMatch {
    pub name: String,
    pub state: MatchState,
}

impl VariantMatch {
    fn matches(&self, config: &Configuration) -> bool {
        let value = config.get(&self.name);
        match (&self.state, value) {
            (MatchState::Enabled, Some(VariantValue::Bool(b))) => *b,
            (MatchState::Enabled, _) => false,
            (MatchState::Disabled, Some(VariantValue::Bool(b))) => !*b,
            (MatchState::Disabled, None) => true,
            (MatchState::Disabled, Some(_)) => false,
            (MatchState::Equals(expected), Some(value)) => state_equals(expected, value),
            (MatchState::Equals(_), None) => false,
        }
    }
}

/// Compare an `=value` matcher against a resolved variant value.
pub(crate) fn state_equals(expected: &str, value: &VariantValue) -> bool {
    match value {
        VariantValue::Choice(c) => c == expected,
        VariantValue::Tokens(t) if expected == NONE_TOKEN => t.is_empty(),
        VariantValue::Tokens(t) => t.contains(expected),
        VariantValue::Bool(b) => match expected {
            "on" | "true" => *b,
            "off" | "false" => !*b,
            _ => false,
        },
    }
}

impl fmt::Display for VariantMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            MatchState::Enabled => write!(f, "+{}", self.name),
            MatchState::Disabled => write!(f, "~{}", self.name),
            MatchState::Equals(v) => write!(f, "{}={}", self.name, v),
        }
    }
}

/// A matcher against a dependency's own variant (`^mumps+int64`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepVariantMatch {
    pub package: String,
    pub variant: String,
    pub state: MatchState,
}

impl DepVariantMatch {
    /// Check the matcher against a resolved dependency variant value.
    pub fn matches_value(&self, value: &VariantValue) -> bool {
        match (&self.state, value) {
            (MatchState::Enabled, VariantValue::Bool(b)) => *b,
            (MatchState::Disabled, VariantValue::Bool(b)) => !*b,
            (MatchState::Equals(expected), value) => state_equals(expected, value),
            _ => false,
        }
    }
}

impl fmt::Display for DepVariantMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            MatchState::Enabled => write!(f, "^{}+{}", self.package, self.variant),
            MatchState::Disabled => write!(f, "^{}~{}", self.package, self.variant),
            MatchState::Equals(v) => write!(f, "^{} {}={}", self.package, self.variant, v),
        }
    }
}

/// A conjunction of matchers; all must hold.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Conjunction {
    pub variants: Vec<VariantMatch>,
    pub version: Option<VersionPredicate>,
    pub deps: Vec<DepVariantMatch>,
}

impl Conjunction {
    /// Check the version and own-variant matchers against a configuration.
    ///
    /// Dependency matchers are not evaluated here; they need a transitive
    /// lookup and are handled by the constraint evaluator.
    pub fn matches_config(&self, config: &Configuration) -> bool {
        if let Some(ref pred) = self.version {
            if !pred.matches(config.version()) {
                return false;
            }
        }
        self.variants.iter().all(|m| m.matches(config))
    }

    /// Whether this conjunction references dependency variants.
    pub fn has_dep_matchers(&self) -> bool {
        !self.deps.is_empty()
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut sep = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            if !first {
                write!(f, " ")?;
            }
            first = false;
            Ok(())
        };
        for m in &self.variants {
            sep(f)?;
            write!(f, "{}", m)?;
        }
        if let Some(ref pred) = self.version {
            sep(f)?;
            write!(f, "@{}", pred)?;
        }
        for d in &self.deps {
            sep(f)?;
            write!(f, "{}", d)?;
        }
        if first {
            write!(f, "<always>")?;
        }
        Ok(())
    }
}

/// Error returned when parsing an invalid predicate clause.
#[derive(Debug, Clone, Error)]
#[error("invalid predicate clause `{clause}`: {reason}")]
pub struct PredicateParseError {
    pub clause: String,
    pub reason: String,
}

impl PredicateParseError {
    fn new(clause: &str, reason: impl Into<String>) -> Self {
        PredicateParseError {
            clause: clause.to_string(),
            reason: reason.into(),
        }
    }
}

impl FromStr for Conjunction {
    type Err = PredicateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut conj = Conjunction::default();

        for token in s.split_whitespace() {
            if let Some(rest) = token.strip_prefix('@') {
                if conj.version.is_some() {
                    return Err(PredicateParseError::new(token, "duplicate version range"));
                }
                let pred = VersionPredicate::parse(rest)
                    .map_err(|e| PredicateParseError::new(token, e.to_string()))?;
                conj.version = Some(pred);
            } else if let Some(rest) = token.strip_prefix('^') {
                conj.deps.push(parse_dep_matcher(token, rest)?);
            } else if let Some(name) = token.strip_prefix('+') {
                check_name(token, name)?;
                conj.variants.push(VariantMatch {
                    name: name.to_string(),
                    state: MatchState::Enabled,
                });
            } else if let Some(name) = token.strip_prefix('~') {
                check_name(token, name)?;
                conj.variants.push(VariantMatch {
                    name: name.to_string(),
                    state: MatchState::Disabled,
                });
            } else if let Some((name, value)) = token.split_once('=') {
                check_name(token, name)?;
                if value.is_empty() {
                    return Err(PredicateParseError::new(token, "empty value"));
                }
                conj.variants.push(VariantMatch {
                    name: name.to_string(),
                    state: MatchState::Equals(value.to_string()),
                });
            } else {
                return Err(PredicateParseError::new(
                    token,
                    "expected `+name`, `~name`, `name=value`, `@range`, or `^dep+name`",
                ));
            }
        }

        Ok(conj)
    }
}

fn parse_dep_matcher(token: &str, rest: &str) -> Result<DepVariantMatch, PredicateParseError> {
    let (package, state, variant) = if let Some(idx) = rest.find('+') {
        (&rest[..idx], MatchState::Enabled, &rest[idx + 1..])
    } else if let Some(idx) = rest.find('~') {
        (&rest[..idx], MatchState::Disabled, &rest[idx + 1..])
    } else {
        return Err(PredicateParseError::new(
            token,
            "dependency matcher needs a variant, e.g. `^mumps+int64`",
        ));
    };

    check_name(token, package)?;
    check_name(token, variant)?;

    Ok(DepVariantMatch {
        package: package.to_string(),
        variant: variant.to_string(),
        state,
    })
}

fn check_name(token: &str, name: &str) -> Result<(), PredicateParseError> {
    if name.is_empty() {
        return Err(PredicateParseError::new(token, "empty name"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(PredicateParseError::new(token, "invalid name character"));
    }
    Ok(())
}

/// A disjunction of conjunctions. An empty predicate always matches.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "PredicateRepr", try_from = "PredicateRepr")]
pub struct Predicate {
    pub any: Vec<Conjunction>,
}

impl Predicate {
    /// The predicate that always matches.
    pub fn always() -> Self {
        Predicate::default()
    }

    /// Parse a single-conjunction predicate.
    pub fn parse(s: &str) -> Result<Self, PredicateParseError> {
        Ok(Predicate {
            any: vec![s.parse()?],
        })
    }

    /// Build a disjunction from clause strings.
    pub fn any_of<I, S>(clauses: I) -> Result<Self, PredicateParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut any = Vec::new();
        for clause in clauses {
            any.push(clause.as_ref().parse()?);
        }
        Ok(Predicate { any })
    }

    /// Check if this predicate trivially matches everything.
    pub fn is_always(&self) -> bool {
        self.any.is_empty()
    }

    /// Evaluate against version and own variants only.
    ///
    /// Conjunctions carrying dependency matchers are skipped here; the
    /// constraint evaluator resolves those separately.
    pub fn matches_config(&self, config: &Configuration) -> bool {
        if self.any.is_empty() {
            return true;
        }
        self.any
            .iter()
            .filter(|c| !c.has_dep_matchers())
            .any(|c| c.matches_config(config))
    }

    /// Whether any conjunction references dependency variants.
    pub fn has_dep_matchers(&self) -> bool {
        self.any.iter().any(Conjunction::has_dep_matchers)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.any.is_empty() {
            return write!(f, "<always>");
        }
        for (i, conj) in self.any.iter().enumerate() {
            if i > 0 {
                write!(f, " or ")?;
            }
            write!(f, "{}", conj)?;
        }
        Ok(())
    }
}

/// Serialized form: one clause string or a list of alternatives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum PredicateRepr {
    One(String),
    Any(Vec<String>),
}

impl From<Predicate> for PredicateRepr {
    fn from(p: Predicate) -> Self {
        let mut clauses: Vec<String> = p.any.iter().map(|c| c.to_string()).collect();
        if clauses.len() == 1 {
            PredicateRepr::One(clauses.remove(0))
        } else {
            PredicateRepr::Any(clauses)
        }
    }
}

impl TryFrom<PredicateRepr> for Predicate {
    type Error = PredicateParseError;

    fn try_from(repr: PredicateRepr) -> Result<Self, Self::Error> {
        match repr {
            PredicateRepr::One(s) => Predicate::parse(&s),
            PredicateRepr::Any(list) => Predicate::any_of(list),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::configuration::Configuration;
    use crate::recipes;

    fn config(spec: &str) -> Configuration {
        let recipe = recipes::palace();
        let spec = spec.parse().unwrap();
        Configuration::from_spec(&recipe, &spec).unwrap()
    }

    #[test]
    fn test_parse_conjunction() {
        let conj: Conjunction = "+cuda ~rocm @>=0.14".parse().unwrap();
        assert_eq!(conj.variants.len(), 2);
        assert!(conj.version.is_some());
        assert!(conj.deps.is_empty());
    }

    #[test]
    fn test_parse_dep_matcher() {
        let conj: Conjunction = "^mumps+int64".parse().unwrap();
        assert_eq!(conj.deps.len(), 1);
        assert_eq!(conj.deps[0].package, "mumps");
        assert_eq!(conj.deps[0].variant, "int64");
        assert_eq!(conj.deps[0].state, MatchState::Enabled);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("cuda".parse::<Conjunction>().is_err());
        assert!("+".parse::<Conjunction>().is_err());
        assert!("^mumps".parse::<Conjunction>().is_err());
        assert!("cuda_arch=".parse::<Conjunction>().is_err());
    }

    #[test]
    fn test_enabled_disabled_matching() {
        let cfg = config("palace@0.13.0 +cuda cuda_arch=80");
        assert!(Predicate::parse("+cuda").unwrap().matches_config(&cfg));
        assert!(Predicate::parse("~rocm").unwrap().matches_config(&cfg));
        assert!(!Predicate::parse("+rocm").unwrap().matches_config(&cfg));
    }

    #[test]
    fn test_disabled_matches_inapplicable_variant() {
        // sundials only exists from 0.14, so at 0.13 `~sundials` holds
        let cfg = config("palace@0.13.0");
        assert!(Predicate::parse("~sundials").unwrap().matches_config(&cfg));
        assert!(!Predicate::parse("+sundials").unwrap().matches_config(&cfg));
    }

    #[test]
    fn test_equals_token_set() {
        let cfg = config("palace@0.13.0 +cuda cuda_arch=80,90");
        assert!(Predicate::parse("cuda_arch=80").unwrap().matches_config(&cfg));
        assert!(!Predicate::parse("cuda_arch=none").unwrap().matches_config(&cfg));

        let bare = config("palace@0.13.0");
        assert!(Predicate::parse("cuda_arch=none").unwrap().matches_config(&bare));
    }

    #[test]
    fn test_version_clause() {
        let old = config("palace@0.12.0");
        let pred = Predicate::parse("+cuda @<0.13.0").unwrap();
        assert!(!pred.matches_config(&old));

        let old_cuda = config("palace@0.12.0 +cuda cuda_arch=80");
        assert!(pred.matches_config(&old_cuda));
    }

    #[test]
    fn test_disjunction() {
        let pred = Predicate::any_of(["+cuda", "+rocm"]).unwrap();
        assert!(pred.matches_config(&config("palace@0.13.0 +cuda cuda_arch=80")));
        assert!(pred.matches_config(&config("palace@0.13.0 +rocm amdgpu_target=gfx90a")));
        assert!(!pred.matches_config(&config("palace@0.13.0")));
    }

    #[test]
    fn test_display_round_trip() {
        let conj: Conjunction = "+cuda ~rocm @>=0.14 ^mumps+int64".parse().unwrap();
        let shown = conj.to_string();
        let reparsed: Conjunction = shown.parse().unwrap();
        assert_eq!(conj, reparsed);
    }
}
