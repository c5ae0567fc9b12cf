//! Common utilities for change request commands.

use std::path::PathBuf;

use clap::Args;
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::{PrError, Result};
use crate::infra::git;
use crate::infra::yunxiao::{CodeupClient, CommentQuery};
use crate::shared::config::{Config, DefaultsConfig};
use crate::shared::output::OutputFormat;

pub const DEFAULT_COMMENT_TYPES: &[&str] = &["GLOBAL_COMMENT", "INLINE_COMMENT"];
pub const DEFAULT_COMMENT_STATES: &[&str] = &["OPENED"];

/// Organization and repository a change request lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoContext {
    pub organization_id: String,
    pub repository_id: String,
}

/// Arguments shared by every `pr` subcommand.
#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct TargetArgs {
    /// Change request local ID (the number shown in the web UI)
    pub id: u64,

    /// Organization ID (defaults to config, $YX_ORGANIZATION_ID, or the origin remote)
    #[arg(long = "org")]
    pub org: Option<String>,

    /// Repository ID or path such as group/repo
    #[arg(short = 'R', long = "repo")]
    pub repo: Option<String>,
}

#[derive(Args, Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputArgs {
    /// Output format (defaults to `defaults.output` in the config file)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write output to a file instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

impl OutputArgs {
    pub fn format_or(&self, config: &Config) -> OutputFormat {
        self.format.unwrap_or(config.defaults.output)
    }
}

/// Resolve the repository context: flags, then config/env defaults, then
/// the `origin` remote of the current git repository.
pub fn resolve_context(target: &TargetArgs, defaults: &DefaultsConfig) -> Result<RepoContext> {
    resolve_context_with(target, defaults, git::detect_codeup_repo)
}

pub(crate) fn resolve_context_with(
    target: &TargetArgs,
    defaults: &DefaultsConfig,
    detect: impl FnOnce() -> Option<(String, String)>,
) -> Result<RepoContext> {
    let mut org = target
        .org
        .clone()
        .or_else(|| defaults.organization_id.clone());
    let mut repo = target
        .repo
        .clone()
        .or_else(|| defaults.repository_id.clone());

    if (org.is_none() || repo.is_none())
        && let Some((detected_org, detected_repo)) = detect()
    {
        debug!(org = %detected_org, repo = %detected_repo, "detected Codeup repository from origin");
        org = org.or(Some(detected_org));
        repo = repo.or(Some(detected_repo));
    }

    Ok(RepoContext {
        organization_id: org.ok_or(PrError::MissingParameter {
            what: "the organization ID",
            flag: "--org",
        })?,
        repository_id: repo.ok_or(PrError::MissingParameter {
            what: "the repository",
            flag: "--repo",
        })?,
    })
}

/// Cartesian product of comment types and states.
pub fn comment_queries(
    types: &[String],
    states: &[String],
    resolved: Option<bool>,
    file_path: Option<&str>,
) -> Vec<CommentQuery> {
    let types: Vec<String> = if types.is_empty() {
        DEFAULT_COMMENT_TYPES.iter().map(|s| s.to_string()).collect()
    } else {
        types.to_vec()
    };
    let states: Vec<String> = if states.is_empty() {
        DEFAULT_COMMENT_STATES.iter().map(|s| s.to_string()).collect()
    } else {
        states.to_vec()
    };

    types
        .iter()
        .flat_map(|comment_type| {
            states.iter().map(move |state| CommentQuery {
                comment_type: comment_type.to_uppercase(),
                state: state.to_uppercase(),
                resolved,
                file_path: file_path.map(str::to_string),
            })
        })
        .collect()
}

/// Run every query concurrently and concatenate the records in query order.
/// Failed combinations are skipped with a warning unless all of them fail.
pub async fn fetch_comment_records(
    client: &dyn CodeupClient,
    ctx: &RepoContext,
    local_id: u64,
    queries: &[CommentQuery],
) -> Result<Vec<Value>> {
    let results = join_all(queries.iter().map(|query| {
        client.fetch_comments(&ctx.organization_id, &ctx.repository_id, local_id, query)
    }))
    .await;

    let mut records = Vec::new();
    let mut last_error = None;
    let mut succeeded = 0;
    for (query, result) in queries.iter().zip(results) {
        match result {
            Ok(batch) => {
                succeeded += 1;
                records.extend(batch);
            }
            Err(e) => {
                warn!(
                    comment_type = %query.comment_type,
                    state = %query.state,
                    error = %e,
                    "comment query failed"
                );
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if succeeded == 0 => Err(e.context("Failed to list comments")),
        _ => Ok(records),
    }
}
