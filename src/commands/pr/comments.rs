//! `yx pr comments`: flat comment listing.

use clap::Args;
use serde::Serialize;

use super::common::{
    OutputArgs, RepoContext, TargetArgs, comment_queries, fetch_comment_records, resolve_context,
};
use super::error::Result;
use super::models::thread::{CommentNode, collect_nodes, dedupe_records};
use crate::infra::yunxiao::{CodeupClient, YunxiaoClient};
use crate::shared::config::Config;
use crate::shared::output::{Tabular, emit};

/// Comment query arguments shared by `pr comments` and `pr threads`.
#[derive(Args, Clone, Debug, Default, PartialEq, Eq)]
pub struct CommentQueryArgs {
    /// Comment type to fetch, e.g. GLOBAL_COMMENT or INLINE_COMMENT (repeatable)
    #[arg(long = "type")]
    pub types: Vec<String>,

    /// Comment state to fetch, e.g. OPENED or DRAFT (repeatable, default OPENED)
    #[arg(long = "state")]
    pub states: Vec<String>,

    /// Only resolved comments
    #[arg(long, conflicts_with = "unresolved")]
    pub resolved: bool,

    /// Only unresolved comments
    #[arg(long)]
    pub unresolved: bool,

    /// Keep the raw API records in JSON output
    #[arg(long)]
    pub raw: bool,
}

impl CommentQueryArgs {
    pub fn resolved_filter(&self) -> Option<bool> {
        match (self.resolved, self.unresolved) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct CommentsArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub query: CommentQueryArgs,

    /// Only comments on this file path (server-side filter)
    #[arg(long = "file")]
    pub file: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CommentList {
    pub comments: Vec<CommentNode>,
}

fn first_line(text: Option<&str>) -> String {
    text.and_then(|t| t.lines().find(|l| !l.trim().is_empty()))
        .unwrap_or_default()
        .trim()
        .to_string()
}

impl Tabular for CommentList {
    fn headers(&self) -> Vec<&'static str> {
        vec!["ID", "AUTHOR", "TYPE", "FILE", "RESOLVED", "TIME", "CONTENT"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.comments
            .iter()
            .map(|c| {
                vec![
                    c.id.clone(),
                    c.author_or_unknown().to_string(),
                    c.comment_type.clone().unwrap_or_default(),
                    c.file_path.clone().unwrap_or_default(),
                    if c.resolved { "yes" } else { "no" }.to_string(),
                    c.comment_time.clone().unwrap_or_default(),
                    first_line(c.content.as_deref()),
                ]
            })
            .collect()
    }
}

pub async fn run(args: &CommentsArgs, config: &Config) -> Result<()> {
    let client = YunxiaoClient::from_config(&config.api)?;
    run_with_client(args, config, &client).await
}

pub async fn run_with_client(
    args: &CommentsArgs,
    config: &Config,
    client: &dyn CodeupClient,
) -> Result<()> {
    let ctx = resolve_context(&args.target, &config.defaults)?;
    let list = collect(args, client, &ctx).await?;
    emit(&list, args.output.format_or(config), args.output.output.as_deref())
}

pub(crate) async fn collect(
    args: &CommentsArgs,
    client: &dyn CodeupClient,
    ctx: &RepoContext,
) -> Result<CommentList> {
    let queries = comment_queries(
        &args.query.types,
        &args.query.states,
        args.query.resolved_filter(),
        args.file.as_deref(),
    );
    let records = dedupe_records(fetch_comment_records(client, ctx, args.target.id, &queries).await?);

    let mut comments: Vec<CommentNode> = collect_nodes(&records).into_values().collect();
    comments.sort_by(|a, b| a.time_ms.cmp(&b.time_ms).then_with(|| a.id.cmp(&b.id)));
    if !args.query.raw {
        for comment in &mut comments {
            comment.raw = serde_json::Value::Null;
        }
    }
    Ok(CommentList { comments })
}
