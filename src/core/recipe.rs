//! Package recipes.
//!
//! A recipe is the static, declarative description of one package: its
//! versions, variants, conflict rules, conditional dependencies, and the
//! flag tables that turn a validated configuration into build definitions.
//! Recipes never change after construction; a build request instantiates a
//! [`Configuration`](crate::core::configuration::Configuration) against one.
//!
//! Recipes are built in code through [`RecipeBuilder`] (the built-in
//! catalog) or loaded from TOML (external recipe files).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::conflict::ConflictRule;
use crate::core::define::{DefineRule, DirLayout};
use crate::core::predicate::Predicate;
use crate::core::requirement::DependencyRequirement;
use crate::core::variant::{VariantDef, VariantKind};
use crate::core::version::PackageVersion;

/// A declarative package recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Package name
    name: String,

    /// One-line description
    #[serde(default)]
    description: String,

    /// Upstream homepage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    homepage: Option<String>,

    /// Known versions, newest first
    versions: Vec<PackageVersion>,

    /// Variant declarations in display order
    #[serde(default)]
    variants: Vec<VariantDef>,

    /// Conflict rule table
    #[serde(default)]
    conflicts: Vec<ConflictRule>,

    /// Conditional dependency table
    #[serde(default)]
    dependencies: Vec<DependencyRequirement>,

    /// Ordered flag table
    #[serde(default)]
    defines: Vec<DefineRule>,

    /// Version-dispatched dependency-directory layouts
    #[serde(default)]
    dir_layouts: Vec<DirLayout>,
}

impl Recipe {
    /// Start building a recipe.
    pub fn builder(name: impl Into<String>, description: impl Into<String>) -> RecipeBuilder {
        RecipeBuilder {
            recipe: Recipe {
                name: name.into(),
                description: description.into(),
                homepage: None,
                versions: Vec::new(),
                variants: Vec::new(),
                conflicts: Vec::new(),
                dependencies: Vec::new(),
                defines: Vec::new(),
                dir_layouts: Vec::new(),
            },
        }
    }

    /// Load a recipe from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Recipe, RecipeError> {
        let recipe: Recipe = toml::from_str(text)?;
        recipe.validate()?;
        Ok(recipe)
    }

    /// The package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The one-line description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Known versions, newest first.
    pub fn versions(&self) -> &[PackageVersion] {
        &self.versions
    }

    /// The default version: the newest release, or the first declared
    /// version when the recipe only has development versions.
    pub fn default_version(&self) -> &PackageVersion {
        self.versions
            .iter()
            .find(|v| !v.is_named())
            .or_else(|| self.versions.first())
            .expect("recipe declares at least one version")
    }

    /// Variant declarations.
    pub fn variants(&self) -> &[VariantDef] {
        &self.variants
    }

    /// Look up a variant declaration by name.
    pub fn variant(&self, name: &str) -> Option<&VariantDef> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// The conflict rule table.
    pub fn conflicts(&self) -> &[ConflictRule] {
        &self.conflicts
    }

    /// The conditional dependency table.
    pub fn dependencies(&self) -> &[DependencyRequirement] {
        &self.dependencies
    }

    /// The ordered flag table.
    pub fn defines(&self) -> &[DefineRule] {
        &self.defines
    }

    /// The version-dispatched directory layouts.
    pub fn dir_layouts(&self) -> &[DirLayout] {
        &self.dir_layouts
    }

    /// Structural checks: unique variant names, flag rules referencing
    /// declared variants, arch gates that are boolean toggles.
    fn validate(&self) -> Result<(), RecipeError> {
        if self.versions.is_empty() {
            return Err(RecipeError::NoVersions {
                recipe: self.name.clone(),
            });
        }

        for (i, def) in self.variants.iter().enumerate() {
            if self.variants[..i].iter().any(|d| d.name == def.name) {
                return Err(RecipeError::DuplicateVariant {
                    name: def.name.clone(),
                });
            }
        }

        for rule in &self.defines {
            match rule {
                DefineRule::FromVariant { variant, .. } => {
                    self.check_variant_ref("flag table", variant)?;
                }
                DefineRule::ArchList { variant, gate, .. } => {
                    self.check_variant_ref("flag table", variant)?;
                    let gate_def = self.check_variant_ref("flag table", gate)?;
                    if !matches!(gate_def.kind, VariantKind::Bool { .. }) {
                        return Err(RecipeError::BadArchGate { gate: gate.clone() });
                    }
                }
                DefineRule::Set { .. } | DefineRule::DepLibraries { .. } => {}
            }
        }

        Ok(())
    }

    fn check_variant_ref<'a>(
        &'a self,
        context: &str,
        name: &str,
    ) -> Result<&'a VariantDef, RecipeError> {
        self.variant(name).ok_or_else(|| RecipeError::UnknownVariantRef {
            context: context.to_string(),
            name: name.to_string(),
        })
    }
}

/// Error loading or validating a recipe.
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("failed to parse recipe")]
    Parse(#[from] toml::de::Error),

    #[error("recipe `{recipe}` declares no versions")]
    NoVersions { recipe: String },

    #[error("variant `{name}` is declared twice")]
    DuplicateVariant { name: String },

    #[error("{context} references undeclared variant `{name}`")]
    UnknownVariantRef { context: String, name: String },

    #[error("arch-list gate `{gate}` must be a boolean variant")]
    BadArchGate { gate: String },
}

/// Builder for in-code recipe declarations.
pub struct RecipeBuilder {
    recipe: Recipe,
}

impl RecipeBuilder {
    /// Set the upstream homepage.
    pub fn homepage(mut self, url: impl Into<String>) -> Self {
        self.recipe.homepage = Some(url.into());
        self
    }

    /// Declare a version. Call newest-first.
    pub fn version(mut self, version: PackageVersion) -> Self {
        self.recipe.versions.push(version);
        self
    }

    /// Declare a variant.
    pub fn variant(mut self, def: VariantDef) -> Self {
        self.recipe.variants.push(def);
        self
    }

    /// Declare a conflict rule.
    pub fn conflict(mut self, when: Predicate, message: impl Into<String>) -> Self {
        self.recipe.conflicts.push(ConflictRule::new(when, message));
        self
    }

    /// Declare a conditional dependency.
    pub fn dependency(mut self, requirement: DependencyRequirement) -> Self {
        self.recipe.dependencies.push(requirement);
        self
    }

    /// Append a flag rule. Declaration order is emission order.
    pub fn define(mut self, rule: DefineRule) -> Self {
        self.recipe.defines.push(rule);
        self
    }

    /// Append a version-dispatched directory layout.
    pub fn dir_layout(mut self, layout: DirLayout) -> Self {
        self.recipe.dir_layouts.push(layout);
        self
    }

    /// Finish, running structural validation.
    pub fn build(self) -> Result<Recipe, RecipeError> {
        self.recipe.validate()?;
        Ok(self.recipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO_RECIPE: &str = r#"
        name = "demo-solver"
        description = "Demo solver package"
        versions = ["develop", "1.2.0", "1.1.0"]

        [[variants]]
        name = "shared"
        kind = "bool"
        default = true
        description = "Build shared libraries"

        [[variants]]
        name = "gpu_arch"
        kind = "multi"
        description = "GPU architectures"

        [[conflicts]]
        when = "~shared @<1.2.0"
        message = "static builds need 1.2.0 or newer"

        [[dependencies]]
        package = "blas-backend"
        forwards = [{ parent = "shared", variant = "shared" }]

        [[defines]]
        rule = "from-variant"
        key = "BUILD_SHARED_LIBS"
        variant = "shared"

        [[dir_layouts]]
        when = "<1.2.0"
        entries = [{ key = "BLAS_DIR", package = "blas-backend" }]
    "#;

    #[test]
    fn test_recipe_from_toml() {
        let recipe = Recipe::from_toml_str(DEMO_RECIPE).unwrap();
        assert_eq!(recipe.name(), "demo-solver");
        assert_eq!(recipe.versions().len(), 3);
        assert_eq!(recipe.variants().len(), 2);
        assert_eq!(recipe.conflicts().len(), 1);
        assert_eq!(recipe.dir_layouts().len(), 1);
    }

    #[test]
    fn test_default_version_skips_named() {
        let recipe = Recipe::from_toml_str(DEMO_RECIPE).unwrap();
        assert_eq!(
            recipe.default_version(),
            &PackageVersion::release(1, 2, 0)
        );
    }

    #[test]
    fn test_duplicate_variant_rejected() {
        let toml_src = r#"
            name = "demo"
            versions = ["1.0.0"]
            [[variants]]
            name = "shared"
            kind = "bool"
            default = true
            [[variants]]
            name = "shared"
            kind = "bool"
            default = false
        "#;
        let err = Recipe::from_toml_str(toml_src).unwrap_err();
        assert!(matches!(err, RecipeError::DuplicateVariant { .. }));
    }

    #[test]
    fn test_flag_rule_must_reference_declared_variant() {
        let toml_src = r#"
            name = "demo"
            versions = ["1.0.0"]
            [[defines]]
            rule = "from-variant"
            key = "BUILD_SHARED_LIBS"
            variant = "shared"
        "#;
        let err = Recipe::from_toml_str(toml_src).unwrap_err();
        assert!(matches!(err, RecipeError::UnknownVariantRef { .. }));
    }

    #[test]
    fn test_no_versions_rejected() {
        let err = Recipe::from_toml_str("name = \"demo\"\nversions = []").unwrap_err();
        assert!(matches!(err, RecipeError::NoVersions { .. }));
    }
}
