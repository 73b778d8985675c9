//! `caravel check` command
//!
//! Validates a configuration spec and reports every violated conflict rule.

use anyhow::{bail, Result};

use caravel::resolver::validate;
use caravel::util::diagnostic;

use crate::cli::CheckArgs;
use crate::commands::{build_configuration, load_config, load_recipe, load_resolver, parse_spec};

pub fn execute(args: CheckArgs, no_color: bool) -> Result<()> {
    let config = load_config();
    let color = config.output.color && !no_color;

    let spec = parse_spec(&args.spec)?;
    let recipe = load_recipe(args.recipe.as_deref(), &spec)?;
    let configuration = build_configuration(&recipe, &spec)?;
    let resolver = load_resolver(args.packages.as_deref(), &config)?;

    match validate(&recipe, &configuration, &resolver) {
        Ok(()) => {
            println!("ok: {}", configuration);
            Ok(())
        }
        Err(err) => {
            diagnostic::emit(&err.to_diagnostic(), color);
            bail!("configuration is invalid");
        }
    }
}
