//! `yx pr files`: changed file list for a patchset range.

use clap::Args;

use super::common::{OutputArgs, TargetArgs, resolve_context};
use super::diff::{RangeArgs, emit_snapshot, load_snapshot, summary_line};
use super::error::Result;
use crate::infra::yunxiao::{CodeupClient, YunxiaoClient};
use crate::shared::config::Config;
use crate::shared::output::OutputFormat;

#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct FilesArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub range: RangeArgs,

    /// Print only file paths, one per line
    #[arg(long, conflicts_with = "format")]
    pub name_only: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub async fn run(args: &FilesArgs, config: &Config) -> Result<()> {
    let client = YunxiaoClient::from_config(&config.api)?;
    run_with_client(args, config, &client).await
}

pub async fn run_with_client(
    args: &FilesArgs,
    config: &Config,
    client: &dyn CodeupClient,
) -> Result<()> {
    let ctx = resolve_context(&args.target, &config.defaults)?;
    let mut snapshot = load_snapshot(client, &ctx, args.target.id, &args.range, config).await?;
    snapshot.raw = None;

    if let Some(warning) = &snapshot.warning {
        eprintln!("warning: {warning}");
    }

    if args.name_only {
        let names: String = snapshot
            .summary
            .files
            .iter()
            .map(|f| format!("{}\n", f.path))
            .collect();
        return crate::shared::output::write_text(&names, args.output.output.as_deref());
    }

    if args.output.format_or(config) != OutputFormat::Json {
        eprintln!("{}", summary_line(&snapshot));
    }
    emit_snapshot(&snapshot, &args.output, config)
}
