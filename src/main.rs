mod cli;
mod commands;
mod infra;
mod shared;

use std::io;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use shared::config::load_config;
use shared::env_var::EnvVars;

#[tokio::main]
async fn main() -> ExitCode {
    let Cli { verbose, command } = Cli::parse();

    let env = EnvVars::load();
    shared::logging::init(verbose, env.log.as_deref());

    match run(command, &env).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, env: &EnvVars) -> anyhow::Result<()> {
    match command {
        Commands::Pr(pr) => pr.run(&load_config()?.with_env(env)).await,
        Commands::Config(cmd) => cmd.run(&load_config()?.with_env(env)),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "yx", &mut io::stdout());
            Ok(())
        }
    }
}
