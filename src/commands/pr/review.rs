//! `yx pr review`: submit a review opinion.

use clap::{ArgGroup, Args};
use serde_json::{Value, json};
use tracing::info;

use super::common::{RepoContext, TargetArgs, resolve_context};
use super::error::{PrError, Result};
use crate::infra::yunxiao::{CodeupClient, YunxiaoClient};
use crate::shared::attempts::{Attempt, try_in_sequence};
use crate::shared::config::Config;

#[derive(Args, Clone, Debug, PartialEq, Eq)]
#[command(group(
    ArgGroup::new("opinion")
        .required(true)
        .args(["approve", "request_changes", "comment"]),
))]
pub struct ReviewArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Approve the change request
    #[arg(long)]
    pub approve: bool,

    /// Request changes
    #[arg(long)]
    pub request_changes: bool,

    /// Leave a review comment without an opinion
    #[arg(long)]
    pub comment: bool,

    /// Review message
    #[arg(short = 'b', long)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opinion {
    Approve,
    RequestChanges,
    Comment,
}

impl Opinion {
    /// Value for `reviewOpinion`/`reviewOpinionStatus`.
    fn status(self) -> &'static str {
        match self {
            Self::Approve => "PASS",
            Self::RequestChanges => "NOT_PASS",
            Self::Comment => "COMMENT",
        }
    }

    /// Value for the lowercase `opinion` field.
    fn verb(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::RequestChanges => "request_changes",
            Self::Comment => "comment",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Self::Approve => "Approved",
            Self::RequestChanges => "Requested changes on",
            Self::Comment => "Commented on",
        }
    }
}

impl ReviewArgs {
    fn opinion(&self) -> Opinion {
        if self.approve {
            Opinion::Approve
        } else if self.request_changes {
            Opinion::RequestChanges
        } else {
            Opinion::Comment
        }
    }
}

/// Payload shapes in the order they are tried.
pub fn review_payloads(opinion: Opinion, body: &str) -> Vec<(&'static str, Value)> {
    vec![
        (
            "reviewOpinion",
            json!({"reviewOpinion": opinion.status(), "reviewComment": body}),
        ),
        (
            "opinion",
            json!({"opinion": opinion.verb(), "comment": body}),
        ),
        (
            "reviewOpinionStatus",
            json!({"reviewOpinionStatus": opinion.status(), "reviewComment": body}),
        ),
    ]
}

pub async fn run(args: &ReviewArgs, config: &Config) -> Result<()> {
    let client = YunxiaoClient::from_config(&config.api)?;
    run_with_client(args, config, &client).await
}

pub async fn run_with_client(
    args: &ReviewArgs,
    config: &Config,
    client: &dyn CodeupClient,
) -> Result<()> {
    let ctx = resolve_context(&args.target, &config.defaults)?;
    let label = submit(args, client, &ctx).await?;
    println!(
        "{} change request !{} (via {label})",
        args.opinion().past_tense(),
        args.target.id
    );
    Ok(())
}

/// Submit the review and return the label of the payload shape that was
/// accepted.
pub(crate) async fn submit(
    args: &ReviewArgs,
    client: &dyn CodeupClient,
    ctx: &RepoContext,
) -> Result<String> {
    let opinion = args.opinion();
    let body = args.body.clone().unwrap_or_default();
    if opinion == Opinion::Comment && body.trim().is_empty() {
        return Err(PrError::MissingParameter {
            what: "the review comment",
            flag: "--body",
        }
        .into());
    }

    let local_id = args.target.id;
    let attempts = review_payloads(opinion, &body)
        .into_iter()
        .map(|(label, payload)| {
            Attempt::new(label, move || {
                Box::pin(async move {
                    client
                        .submit_review(&ctx.organization_id, &ctx.repository_id, local_id, &payload)
                        .await
                })
            })
        })
        .collect();

    let (label, _) = try_in_sequence(attempts).await?;
    info!(%label, "review submitted");
    Ok(label)
}
