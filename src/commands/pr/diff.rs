//! `yx pr diff`: changed files, directory tree, or unified patch for a
//! patchset range.

use clap::Args;
use serde::Serialize;

use super::common::{OutputArgs, RepoContext, TargetArgs, resolve_context};
use super::error::{PrError, Result};
use super::models::patch::filter_patch;
use super::models::path_tree::{PathTree, TreeNode};
use super::models::patchset::{Patchset, PatchsetRange, parse_patchsets, resolve_range};
use super::models::snapshot::{
    DiffSnapshot, build_snapshot, filter_by_paths, normalize_path, resolve_patch_commits,
};
use crate::infra::yunxiao::{CodeupClient, YunxiaoClient};
use crate::shared::config::Config;
use crate::shared::output::{OutputFormat, Tabular, emit, write_text};

/// Range and file selection shared by `pr diff` and `pr files`.
#[derive(Args, Clone, Debug, Default, PartialEq, Eq)]
pub struct RangeArgs {
    /// Base patchset ID (defaults to the target snapshot the head was based on)
    #[arg(long)]
    pub from: Option<String>,

    /// Head patchset ID (defaults to the latest source revision)
    #[arg(long)]
    pub to: Option<String>,

    /// Only include files whose path equals or ends with this value (repeatable)
    #[arg(short = 'f', long = "file")]
    pub files: Vec<String>,

    /// Maximum number of files to list (defaults to `defaults.file_limit`)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct DiffArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub range: RangeArgs,

    /// Show changed files as a directory tree
    #[arg(long, conflicts_with = "patch")]
    pub tree: bool,

    /// Print the unified patch between the two patchsets' commits
    #[arg(long)]
    pub patch: bool,

    /// Include the raw changeTree response in JSON output
    #[arg(long)]
    pub raw: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl Tabular for DiffSnapshot {
    fn headers(&self) -> Vec<&'static str> {
        vec!["FILE", "ADDED", "DELETED", "FLAGS"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.summary
            .files
            .iter()
            .map(|f| {
                let mut flags = Vec::new();
                if f.renamed {
                    flags.push(match &f.old_path {
                        Some(old) => format!("renamed from {old}"),
                        None => "renamed".to_string(),
                    });
                }
                if f.binary {
                    flags.push("binary".to_string());
                }
                let count = |n: Option<i64>| n.map(|n| n.to_string()).unwrap_or_default();
                vec![
                    f.path.clone(),
                    count(f.additions),
                    count(f.deletions),
                    flags.join(", "),
                ]
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeReport {
    pub range: PatchsetRange,
    pub tree: Vec<TreeNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// One-line summary printed to stderr above table output.
pub fn summary_line(snapshot: &DiffSnapshot) -> String {
    let summary = &snapshot.summary;
    let mut line = format!(
        "{} files changed, +{} -{} ({}..{})",
        summary.changed_files_count,
        summary.total_additions,
        summary.total_deletions,
        snapshot.range.from.as_deref().unwrap_or("-"),
        snapshot.range.to.as_deref().unwrap_or("-"),
    );
    if summary.truncated {
        line.push_str(&format!(", showing {}", summary.files.len()));
    }
    line
}

/// Fetch patchsets and resolve the range for `args`.
pub(crate) async fn load_range(
    client: &dyn CodeupClient,
    ctx: &RepoContext,
    local_id: u64,
    args: &RangeArgs,
) -> Result<(Vec<Patchset>, PatchsetRange)> {
    let raw = client
        .fetch_patchsets(&ctx.organization_id, &ctx.repository_id, local_id)
        .await?;
    let patchsets = parse_patchsets(&raw);
    if patchsets.is_empty() && args.to.is_none() {
        return Err(PrError::NoPatchsets(local_id).into());
    }
    let range = resolve_range(&patchsets, args.from.as_deref(), args.to.as_deref());
    Ok((patchsets, range))
}

/// Build the snapshot for `args`, with `--file` filters applied.
pub(crate) async fn load_snapshot(
    client: &dyn CodeupClient,
    ctx: &RepoContext,
    local_id: u64,
    args: &RangeArgs,
    config: &Config,
) -> Result<DiffSnapshot> {
    let (_, range) = load_range(client, ctx, local_id, args).await?;
    let limit = args.limit.unwrap_or(config.defaults.file_limit);
    let mut snapshot = build_snapshot(client, ctx, local_id, &range, limit).await;
    if !args.files.is_empty() {
        snapshot.summary = filter_by_paths(&snapshot.summary, &args.files);
    }
    Ok(snapshot)
}

pub async fn run(args: &DiffArgs, config: &Config) -> Result<()> {
    let client = YunxiaoClient::from_config(&config.api)?;
    run_with_client(args, config, &client).await
}

pub async fn run_with_client(
    args: &DiffArgs,
    config: &Config,
    client: &dyn CodeupClient,
) -> Result<()> {
    let ctx = resolve_context(&args.target, &config.defaults)?;
    let text = render(args, config, client, &ctx).await?;
    write_text(&text, args.output.output.as_deref())
}

pub(crate) async fn render(
    args: &DiffArgs,
    config: &Config,
    client: &dyn CodeupClient,
    ctx: &RepoContext,
) -> Result<String> {
    let format = args.output.format_or(config);

    if args.patch {
        let (patchsets, range) = load_range(client, ctx, args.target.id, &args.range).await?;
        let (from_sha, to_sha) = resolve_patch_commits(&patchsets, &range)?;
        let patch = client
            .fetch_compare_patch(&ctx.organization_id, &ctx.repository_id, &from_sha, &to_sha)
            .await?;
        return Ok(filter_patch(&patch, &args.range.files));
    }

    let mut snapshot = load_snapshot(client, ctx, args.target.id, &args.range, config).await?;
    if !args.raw {
        snapshot.raw = None;
    }
    if let Some(warning) = &snapshot.warning {
        eprintln!("warning: {warning}");
    }

    if args.tree {
        let tree = PathTree::from_paths(snapshot.summary.files.iter().map(|f| f.path.as_str()));
        if format == OutputFormat::Json {
            let report = TreeReport {
                range: snapshot.range.clone(),
                tree: tree.nodes(),
                warning: snapshot.warning.clone(),
            };
            return Ok(format!("{}\n", serde_json::to_string_pretty(&report)?));
        }
        let files = &snapshot.summary.files;
        return Ok(tree.render(|path| {
            files.iter().find(|f| normalize_path(&f.path) == path).map(|f| {
                format!(
                    "+{} -{}",
                    f.additions.unwrap_or(0),
                    f.deletions.unwrap_or(0)
                )
            })
        }));
    }

    if format != OutputFormat::Json {
        eprintln!("{}", summary_line(&snapshot));
    }
    crate::shared::output::render(&snapshot, format)
}

/// Emit a snapshot as a file list; used by `pr files`.
pub(crate) fn emit_snapshot(snapshot: &DiffSnapshot, args: &OutputArgs, config: &Config) -> Result<()> {
    emit(snapshot, args.format_or(config), args.output.as_deref())
}
