//! `caravel flags` command
//!
//! Validates a configuration and prints its ordered build definitions.

use anyhow::{bail, Result};

use caravel::flags::translate;
use caravel::resolver::validate;
use caravel::util::{diagnostic, OutputFormat};

use crate::cli::FlagsArgs;
use crate::commands::{
    build_configuration, load_config, load_recipe, load_resolver, output_format, parse_spec,
};

pub fn execute(args: FlagsArgs, no_color: bool) -> Result<()> {
    let config = load_config();
    let color = config.output.color && !no_color;
    let format = output_format(args.format.as_deref(), &config)?;

    let spec = parse_spec(&args.spec)?;
    let recipe = load_recipe(args.recipe.as_deref(), &spec)?;
    let configuration = build_configuration(&recipe, &spec)?;
    let resolver = load_resolver(args.packages.as_deref(), &config)?;

    let defines = validate(&recipe, &configuration, &resolver)
        .and_then(|()| translate(&recipe, &configuration, &resolver));

    let defines = match defines {
        Ok(defines) => defines,
        Err(err) => {
            diagnostic::emit(&err.to_diagnostic(), color);
            bail!("flag translation failed");
        }
    };

    match format {
        OutputFormat::Text => {
            for define in &defines {
                println!("{}", define);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&defines)?);
        }
    }

    Ok(())
}
