//! `yx pr threads`: comments grouped into discussion threads.

use chrono::Utc;
use clap::Args;
use serde::Serialize;

use super::comments::CommentQueryArgs;
use super::common::{
    OutputArgs, RepoContext, TargetArgs, comment_queries, fetch_comment_records, resolve_context,
};
use super::error::{PrError, Result};
use super::models::thread::{CommentThread, summarize_threads};
use super::models::thread_filter::{ThreadFilter, ThreadSort};
use crate::infra::yunxiao::{CodeupClient, YunxiaoClient};
use crate::shared::config::Config;
use crate::shared::output::{Tabular, emit};
use crate::shared::time::parse_since;

#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct ThreadsArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub query: CommentQueryArgs,

    /// Only threads touching this path; matches exact paths or path suffixes (repeatable)
    #[arg(short = 'f', long = "file")]
    pub files: Vec<String>,

    /// Only threads that have at least one reply
    #[arg(long)]
    pub with_replies: bool,

    /// Only threads with a participant whose name, username, ID or email contains this value
    #[arg(long)]
    pub author: Option<String>,

    /// Only threads whose text contains every given keyword (repeatable, case-insensitive)
    #[arg(long = "contains")]
    pub contains: Vec<String>,

    /// Only threads active since a timestamp or relative age (30m, 12h, 7d, 2w)
    #[arg(long)]
    pub since: Option<String>,

    /// Thread order by last activity
    #[arg(long, value_enum, default_value_t = ThreadSort::Latest)]
    pub sort: ThreadSort,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ThreadList {
    pub threads: Vec<CommentThread>,
}

impl Tabular for ThreadList {
    fn headers(&self) -> Vec<&'static str> {
        vec![
            "THREAD",
            "STATUS",
            "COMMENTS",
            "FILE",
            "PARTICIPANTS",
            "LAST ACTIVITY",
            "FIRST COMMENT",
        ]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.threads
            .iter()
            .map(|t| {
                vec![
                    t.thread_id.clone(),
                    if t.resolved { "resolved" } else { "open" }.to_string(),
                    t.total_comments.to_string(),
                    t.file_paths.join(", "),
                    t.participants.join(", "),
                    t.last_comment_at.clone().unwrap_or_default(),
                    t.root_comment
                        .content
                        .as_deref()
                        .and_then(|c| c.lines().next())
                        .unwrap_or_default()
                        .to_string(),
                ]
            })
            .collect()
    }
}

impl ThreadsArgs {
    fn filter(&self) -> Result<ThreadFilter> {
        let since_ms = match &self.since {
            Some(text) => Some(
                parse_since(text, Utc::now()).ok_or_else(|| PrError::InvalidSince(text.clone()))?,
            ),
            None => None,
        };
        Ok(ThreadFilter {
            file_paths: self.files.clone(),
            with_replies: self.with_replies,
            author: self.author.clone(),
            contains: self.contains.clone(),
            since_ms,
            sort: self.sort,
        })
    }
}

pub async fn run(args: &ThreadsArgs, config: &Config) -> Result<()> {
    let client = YunxiaoClient::from_config(&config.api)?;
    run_with_client(args, config, &client).await
}

pub async fn run_with_client(
    args: &ThreadsArgs,
    config: &Config,
    client: &dyn CodeupClient,
) -> Result<()> {
    let ctx = resolve_context(&args.target, &config.defaults)?;
    let list = collect(args, client, &ctx).await?;
    emit(&list, args.output.format_or(config), args.output.output.as_deref())
}

pub(crate) async fn collect(
    args: &ThreadsArgs,
    client: &dyn CodeupClient,
    ctx: &RepoContext,
) -> Result<ThreadList> {
    let filter = args.filter()?;
    let queries = comment_queries(
        &args.query.types,
        &args.query.states,
        args.query.resolved_filter(),
        None,
    );
    let records = fetch_comment_records(client, ctx, args.target.id, &queries).await?;

    let mut threads = filter.apply(summarize_threads(&records));
    if !args.query.raw {
        for thread in &mut threads {
            thread.root_comment.raw = serde_json::Value::Null;
            for reply in &mut thread.replies {
                reply.raw = serde_json::Value::Null;
            }
        }
    }
    Ok(ThreadList { threads })
}
