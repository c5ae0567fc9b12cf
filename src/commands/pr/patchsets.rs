//! `yx pr patchsets`: list revisions and the suggested diff range.

use clap::Args;
use serde::Serialize;

use super::common::{OutputArgs, RepoContext, TargetArgs, resolve_context};
use super::error::Result;
use super::models::patchset::{
    Patchset, PatchsetRange, parse_patchsets, resolve_range, sort_patchsets,
};
use crate::infra::yunxiao::{CodeupClient, YunxiaoClient};
use crate::shared::config::Config;
use crate::shared::output::{Tabular, emit};
use crate::shared::time::format_ms;

#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct PatchsetsArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Base patchset to mark (defaults to the suggested base)
    #[arg(long)]
    pub from: Option<String>,

    /// Head patchset to mark (defaults to the latest source revision)
    #[arg(long)]
    pub to: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchsetReport {
    pub patchsets: Vec<Patchset>,
    pub range: PatchsetRange,
}

impl Tabular for PatchsetReport {
    fn headers(&self) -> Vec<&'static str> {
        vec!["ID", "VERSION", "TYPE", "COMMIT", "CREATED", "RANGE"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.patchsets
            .iter()
            .map(|p| {
                let mark = if self.range.to.as_deref() == Some(p.id.as_str()) {
                    "to"
                } else if self.range.from.as_deref() == Some(p.id.as_str()) {
                    "from"
                } else {
                    ""
                };
                vec![
                    p.id.clone(),
                    p.version.to_string(),
                    p.kind.as_str().to_string(),
                    p.commit_id
                        .as_deref()
                        .map(|sha| sha.chars().take(12).collect())
                        .unwrap_or_default(),
                    if p.create_time > 0 {
                        format_ms(p.create_time)
                    } else {
                        String::new()
                    },
                    mark.to_string(),
                ]
            })
            .collect()
    }
}

pub async fn run(args: &PatchsetsArgs, config: &Config) -> Result<()> {
    let client = YunxiaoClient::from_config(&config.api)?;
    run_with_client(args, config, &client).await
}

pub async fn run_with_client(
    args: &PatchsetsArgs,
    config: &Config,
    client: &dyn CodeupClient,
) -> Result<()> {
    let ctx = resolve_context(&args.target, &config.defaults)?;
    let report = collect(args, client, &ctx).await?;
    emit(
        &report,
        args.output.format_or(config),
        args.output.output.as_deref(),
    )
}

pub(crate) async fn collect(
    args: &PatchsetsArgs,
    client: &dyn CodeupClient,
    ctx: &RepoContext,
) -> Result<PatchsetReport> {
    let raw = client
        .fetch_patchsets(&ctx.organization_id, &ctx.repository_id, args.target.id)
        .await?;
    let mut patchsets = parse_patchsets(&raw);
    sort_patchsets(&mut patchsets);
    let range = resolve_range(&patchsets, args.from.as_deref(), args.to.as_deref());

    Ok(PatchsetReport { patchsets, range })
}
