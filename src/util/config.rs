//! Configuration file support for Caravel.
//!
//! Caravel supports two configuration file locations:
//! - Global: `~/.caravel/config.toml` - User-wide defaults
//! - Project: `.caravel/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Output format for machine-readable commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "invalid output format '{}', valid values: text, json",
                s
            )),
        }
    }
}

/// Caravel configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output settings
    pub output: OutputConfig,

    /// Resolution settings
    pub resolve: ResolveConfig,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Use colored diagnostics
    pub color: bool,

    /// Default format for `flags` and `deps`
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            color: true,
            format: OutputFormat::Text,
        }
    }
}

/// Resolution settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Default packages file consulted when `--packages` is not given
    pub packages_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration, merging global then project files.
    pub fn load(project_dir: &Path) -> Result<Config> {
        let mut config = Config::default();

        if let Some(home) = std::env::var_os("HOME") {
            let global = PathBuf::from(home).join(".caravel").join("config.toml");
            if global.exists() {
                config = Self::read(&global)?;
            }
        }

        let project = project_dir.join(".caravel").join("config.toml");
        if project.exists() {
            let overlay = Self::read(&project)?;
            config.merge(overlay);
        }

        Ok(config)
    }

    fn read(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Overlay project settings onto this config.
    fn merge(&mut self, overlay: Config) {
        self.output = overlay.output;
        if overlay.resolve.packages_file.is_some() {
            self.resolve.packages_file = overlay.resolve.packages_file;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.output.color);
        assert_eq!(config.output.format, OutputFormat::Text);
        assert!(config.resolve.packages_file.is_none());
    }

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(
            r#"
                [output]
                color = false
                format = "json"

                [resolve]
                packages_file = "site/packages.toml"
            "#,
        )
        .unwrap();
        assert!(!config.output.color);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(
            config.resolve.packages_file,
            Some(PathBuf::from("site/packages.toml"))
        );
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
