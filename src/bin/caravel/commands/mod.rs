//! Command implementations

pub mod check;
pub mod completions;
pub mod deps;
pub mod flags;
pub mod variants;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use caravel::core::configuration::Configuration;
use caravel::core::recipe::Recipe;
use caravel::core::spec::ConfigSpec;
use caravel::recipes;
use caravel::registry::InMemoryResolver;
use caravel::util::{Config, OutputFormat};

/// Load the recipe: an explicit file, the package named in the spec, or the
/// default built-in.
pub fn load_recipe(path: Option<&Path>, spec: &ConfigSpec) -> Result<Recipe> {
    if let Some(path) = path {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read recipe file {}", path.display()))?;
        return Recipe::from_toml_str(&text)
            .with_context(|| format!("failed to load recipe file {}", path.display()));
    }

    let name = spec.package.as_deref().unwrap_or("palace");
    recipes::builtin(name).with_context(|| {
        format!(
            "no built-in recipe for `{}` (available: {})",
            name,
            recipes::builtin_names().join(", ")
        )
    })
}

/// Parse the space-separated spec tokens from the command line.
pub fn parse_spec(tokens: &[String]) -> Result<ConfigSpec> {
    let joined = tokens.join(" ");
    joined
        .parse()
        .with_context(|| format!("failed to parse spec `{}`", joined))
}

/// Build the configuration for a parsed spec.
pub fn build_configuration(recipe: &Recipe, spec: &ConfigSpec) -> Result<Configuration> {
    Configuration::from_spec(recipe, spec)
        .with_context(|| format!("invalid configuration for `{}`", recipe.name()))
}

/// Load installed-package metadata: `--packages`, then the config file's
/// default, then empty.
pub fn load_resolver(packages: Option<&Path>, config: &Config) -> Result<InMemoryResolver> {
    let path: Option<PathBuf> = packages
        .map(Path::to_path_buf)
        .or_else(|| config.resolve.packages_file.clone());

    match path {
        Some(path) => InMemoryResolver::from_path(&path)
            .with_context(|| format!("failed to load packages file {}", path.display())),
        None => Ok(InMemoryResolver::new()),
    }
}

/// Load user configuration for the current directory.
pub fn load_config() -> Config {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match Config::load(&cwd) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("ignoring unreadable config: {:#}", e);
            Config::default()
        }
    }
}

/// Resolve the output format: `--format` wins over the config file.
pub fn output_format(flag: Option<&str>, config: &Config) -> Result<OutputFormat> {
    match flag {
        Some(s) => s.parse().map_err(anyhow::Error::msg),
        None => Ok(config.output.format),
    }
}
