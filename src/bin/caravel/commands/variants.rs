//! `caravel variants` command
//!
//! Lists a recipe's variants with defaults and applicability.

use anyhow::{Context, Result};

use caravel::core::spec::ConfigSpec;
use caravel::core::version::PackageVersion;

use crate::cli::VariantsArgs;
use crate::commands::load_recipe;

pub fn execute(args: VariantsArgs) -> Result<()> {
    let recipe = load_recipe(args.recipe.as_deref(), &ConfigSpec::default())?;

    let at: Option<PackageVersion> = match args.at {
        Some(ref text) => Some(
            text.parse()
                .with_context(|| format!("invalid version `{}`", text))?,
        ),
        None => None,
    };

    println!("{} - {}", recipe.name(), recipe.description());
    println!(
        "versions: {}",
        recipe
            .versions()
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!();

    let width = recipe
        .variants()
        .iter()
        .map(|d| d.name.len())
        .max()
        .unwrap_or(0);

    for def in recipe.variants() {
        if let (Some(version), Some(when)) = (&at, &def.when) {
            if !when.matches(version) {
                continue;
            }
        }

        let default = def.kind.default_value();
        print!("  {:width$}  [{}]", def.name, default, width = width);
        if !def.description.is_empty() {
            print!("  {}", def.description);
        }
        if let Some(ref when) = def.when {
            print!(" (only @{})", when);
        }
        println!();
    }

    Ok(())
}
