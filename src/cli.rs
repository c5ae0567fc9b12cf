use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::commands::config::ConfigCommands;
use crate::commands::pr::PrCommands;

#[derive(Parser)]
#[command(
    name = "yx",
    bin_name = "yx",
    version,
    about,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Work with Codeup change requests
    #[command(subcommand)]
    Pr(PrCommands),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}
