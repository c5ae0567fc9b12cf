use clap::Subcommand;

use crate::shared::config::{Config, generate_schema};

/// Configuration management commands.
#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum ConfigCommands {
    /// Print the effective configuration (file values plus environment overrides) as YAML
    Show,

    /// Print JSON Schema for the configuration file
    Schema,
}

impl ConfigCommands {
    pub fn run(&self, config: &Config) -> anyhow::Result<()> {
        let text = match self {
            Self::Show => serde_yaml::to_string(config)?,
            Self::Schema => format!("{}\n", serde_json::to_string_pretty(&generate_schema())?),
        };
        print!("{text}");
        Ok(())
    }
}
