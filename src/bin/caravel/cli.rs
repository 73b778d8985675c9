//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Caravel - resolve package variants and generate build flags
#[derive(Parser)]
#[command(name = "caravel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List a recipe's variants, defaults, and applicability
    Variants(VariantsArgs),

    /// Validate a configuration spec against its recipe
    Check(CheckArgs),

    /// Print the ordered build definitions for a valid configuration
    Flags(FlagsArgs),

    /// Print the dependency requests derived from a configuration
    Deps(DepsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct VariantsArgs {
    /// Recipe file to load instead of the built-in catalog
    #[arg(long)]
    pub recipe: Option<PathBuf>,

    /// Show variants applicable at this version only
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Configuration spec, e.g. `palace@0.13.0 +cuda cuda_arch=80`
    #[arg(required = true)]
    pub spec: Vec<String>,

    /// Recipe file to load instead of the built-in catalog
    #[arg(long)]
    pub recipe: Option<PathBuf>,

    /// Installed-package metadata (TOML)
    #[arg(long, env = "CARAVEL_PACKAGES")]
    pub packages: Option<PathBuf>,
}

#[derive(Args)]
pub struct FlagsArgs {
    /// Configuration spec, e.g. `palace@0.13.0 +cuda cuda_arch=80`
    #[arg(required = true)]
    pub spec: Vec<String>,

    /// Recipe file to load instead of the built-in catalog
    #[arg(long)]
    pub recipe: Option<PathBuf>,

    /// Installed-package metadata (TOML)
    #[arg(long, env = "CARAVEL_PACKAGES")]
    pub packages: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long)]
    pub format: Option<String>,
}

#[derive(Args)]
pub struct DepsArgs {
    /// Configuration spec, e.g. `palace@0.13.0 +mumps`
    #[arg(required = true)]
    pub spec: Vec<String>,

    /// Recipe file to load instead of the built-in catalog
    #[arg(long)]
    pub recipe: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long)]
    pub format: Option<String>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
