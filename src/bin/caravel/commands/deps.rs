//! `caravel deps` command
//!
//! Prints the dependency requests a configuration derives from the recipe's
//! conditional dependency table.

use anyhow::Result;

use caravel::resolver::requirements;
use caravel::util::OutputFormat;

use crate::cli::DepsArgs;
use crate::commands::{build_configuration, load_config, load_recipe, output_format, parse_spec};

pub fn execute(args: DepsArgs) -> Result<()> {
    let config = load_config();
    let format = output_format(args.format.as_deref(), &config)?;

    let spec = parse_spec(&args.spec)?;
    let recipe = load_recipe(args.recipe.as_deref(), &spec)?;
    let configuration = build_configuration(&recipe, &spec)?;

    let requests = requirements(&recipe, &configuration);

    match format {
        OutputFormat::Text => {
            for request in &requests {
                println!("{}", request);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&requests)?);
        }
    }

    Ok(())
}
