//! `yx pr checks`: CI and review status, optionally watched until settled.

use chrono::Local;
use clap::Args;
use serde_json::Value;
use tracing::{debug, warn};

use super::common::{OutputArgs, RepoContext, TargetArgs, resolve_context};
use super::error::Result;
use super::models::check::{ChecksSummary, summarize_checks};
use super::models::patchset::{PatchsetKind, parse_patchsets, sort_patchsets};
use super::watch::{WatchConfig, watch_until_settled};
use crate::infra::yunxiao::{CodeupClient, YunxiaoClient};
use crate::shared::config::Config;
use crate::shared::json::first_str;
use crate::shared::output::{Tabular, emit};

const SOURCE_COMMIT_KEYS: &[&str] = &["sourceCommitId", "sourceSha", "headCommitId"];

#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct ChecksArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Poll until no check is pending
    #[arg(long)]
    pub watch: bool,

    /// Polling interval in seconds (defaults to `watch.interval_ms`)
    #[arg(long, requires = "watch")]
    pub interval: Option<u64>,

    /// Timeout in seconds (defaults to `watch.timeout_ms`)
    #[arg(long, requires = "watch")]
    pub timeout: Option<u64>,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl ChecksArgs {
    fn watch_config(&self, config: &Config) -> WatchConfig {
        WatchConfig::from_millis(
            self.interval
                .map_or(config.watch.interval_ms, |secs| secs * 1000),
            self.timeout
                .map_or(config.watch.timeout_ms, |secs| secs * 1000),
        )
    }
}

impl Tabular for ChecksSummary {
    fn headers(&self) -> Vec<&'static str> {
        vec!["NAME", "RESULT", "STATUS", "DESCRIPTION", "URL"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.checks
            .iter()
            .map(|c| {
                vec![
                    c.name.clone(),
                    c.conclusion.as_str().to_string(),
                    c.status.clone(),
                    c.description.clone().unwrap_or_default(),
                    c.url.clone().unwrap_or_default(),
                ]
            })
            .collect()
    }
}

pub fn summary_line(summary: &ChecksSummary) -> String {
    let mut line = format!(
        "{} checks: {} passed, {} failed, {} pending, {} neutral",
        summary.total, summary.pass, summary.fail, summary.pending, summary.neutral
    );
    if let Some(status) = &summary.pull_request_status {
        line.push_str(&format!(" (change request: {status})"));
    }
    line
}

pub async fn run(args: &ChecksArgs, config: &Config) -> Result<()> {
    let client = YunxiaoClient::from_config(&config.api)?;
    run_with_client(args, config, &client).await
}

pub async fn run_with_client(
    args: &ChecksArgs,
    config: &Config,
    client: &dyn CodeupClient,
) -> Result<()> {
    let ctx = resolve_context(&args.target, &config.defaults)?;
    let summary = run_checks(args, config, client, &ctx).await?;

    eprintln!("{}", summary_line(&summary));
    emit(
        &summary,
        args.output.format_or(config),
        args.output.output.as_deref(),
    )
}

/// Fetch once, or watch until settled when `--watch` is given.
pub(crate) async fn run_checks(
    args: &ChecksArgs,
    config: &Config,
    client: &dyn CodeupClient,
    ctx: &RepoContext,
) -> Result<ChecksSummary> {
    let local_id = args.target.id;
    let initial = fetch_summary(client, ctx, local_id).await?;
    if !args.watch {
        return Ok(initial);
    }

    let watch = args.watch_config(config);
    let outcome = watch_until_settled(
        initial,
        watch,
        || fetch_summary(client, ctx, local_id),
        |summary| {
            eprintln!("[{}] {}", Local::now().format("%H:%M:%S"), summary_line(summary));
            Ok(())
        },
    )
    .await?;

    if outcome.timed_out {
        eprintln!(
            "Timed out after {}s with {} check(s) still pending",
            watch.timeout.as_secs(),
            outcome.summary.pending
        );
    }
    Ok(outcome.summary)
}

/// The head commit of the change request: from the detail when present,
/// otherwise the newest source patchset's commit.
async fn source_commit(
    client: &dyn CodeupClient,
    ctx: &RepoContext,
    local_id: u64,
    detail: &Value,
) -> Option<String> {
    if let Some(sha) = first_str(detail, SOURCE_COMMIT_KEYS) {
        return Some(sha);
    }

    let raw = client
        .fetch_patchsets(&ctx.organization_id, &ctx.repository_id, local_id)
        .await
        .inspect_err(|e| warn!(error = %e, "failed to list patchsets"))
        .ok()?;
    let mut patchsets = parse_patchsets(&raw);
    sort_patchsets(&mut patchsets);
    patchsets
        .iter()
        .rev()
        .filter(|p| p.kind == PatchsetKind::MergeSource)
        .find_map(|p| p.commit_id.clone())
}

/// One snapshot of every status feed. Only the detail request is
/// required; check runs and commit statuses degrade to empty lists.
pub(crate) async fn fetch_summary(
    client: &dyn CodeupClient,
    ctx: &RepoContext,
    local_id: u64,
) -> Result<ChecksSummary> {
    let detail = client
        .fetch_change_request_detail(&ctx.organization_id, &ctx.repository_id, local_id)
        .await?;

    let Some(sha) = source_commit(client, ctx, local_id, &detail).await else {
        debug!("no source commit found, using embedded checks only");
        return Ok(summarize_checks(&detail, &[], &[]));
    };

    let (runs, statuses) = tokio::join!(
        client.fetch_check_runs(&ctx.organization_id, &ctx.repository_id, &sha),
        client.fetch_commit_statuses(&ctx.organization_id, &ctx.repository_id, &sha),
    );
    let runs = runs.unwrap_or_else(|e| {
        warn!(error = %e, "failed to fetch check runs");
        Vec::new()
    });
    let statuses = statuses.unwrap_or_else(|e| {
        warn!(error = %e, "failed to fetch commit statuses");
        Vec::new()
    });

    Ok(summarize_checks(&detail, &runs, &statuses))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::yunxiao::MockCodeupClient;
    use crate::infra::yunxiao::mock::YunxiaoMockServer;
    use serde_json::json;

    fn ctx() -> RepoContext {
        RepoContext {
            organization_id: "org".to_string(),
            repository_id: "repo".to_string(),
        }
    }

    fn args(watch: bool) -> ChecksArgs {
        ChecksArgs {
            target: TargetArgs {
                id: 2,
                org: Some("org".to_string()),
                repo: Some("repo".to_string()),
            },
            watch,
            interval: None,
            timeout: None,
            output: OutputArgs::default(),
        }
    }

    fn fast_config() -> Config {
        let mut config = Config::default();
        config.watch.interval_ms = 1;
        config.watch.timeout_ms = 5_000;
        config
    }

    #[tokio::test]
    async fn single_fetch_merges_feeds() {
        let client = MockCodeupClient::new()
            .with_detail(json!({"status": "UNDER_REVIEW", "sourceCommitId": "abc"}))
            .with_check_runs(vec![json!({"name": "build", "conclusion": "success"})])
            .with_commit_statuses(vec![json!({"context": "lint", "state": "pending"})]);

        let summary = run_checks(&args(false), &fast_config(), &client, &ctx())
            .await
            .unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.pass, 1);
        assert_eq!(summary.pending, 1);
        assert_eq!(*client.check_run_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn falls_back_to_latest_source_patchset_commit() {
        let mock = YunxiaoMockServer::start().await;
        let repo = mock.repo("org", "repo");
        repo.detail(2, json!({"status": "UNDER_REVIEW"})).await;
        repo.patchsets(
            2,
            json!([
                {"patchSetBizId": "s1", "versionNo": 1, "relatedMergeItemType": "MERGE_SOURCE", "commitId": "old"},
                {"patchSetBizId": "s2", "versionNo": 2, "relatedMergeItemType": "MERGE_SOURCE", "commitId": "new"},
                {"patchSetBizId": "t2", "versionNo": 2, "relatedMergeItemType": "MERGE_TARGET", "commitId": "target"}
            ]),
        )
        .await;
        repo.check_runs("new", json!([{"name": "build", "status": "failure"}]))
            .await;
        repo.commit_statuses("new", json!([])).await;

        let summary = fetch_summary(&mock.client(), &ctx(), 2).await.unwrap();

        assert_eq!(summary.fail, 1);
        assert_eq!(summary.pull_request_status.as_deref(), Some("UNDER_REVIEW"));
    }

    #[tokio::test]
    async fn status_feed_errors_degrade_to_empty() {
        let mock = YunxiaoMockServer::start().await;
        let repo = mock.repo("org", "repo");
        repo.detail(
            2,
            json!({"sourceCommitId": "abc", "checks": [{"name": "merge", "status": "NO_CONFLICT"}]}),
        )
        .await;

        let summary = fetch_summary(&mock.client(), &ctx(), 2).await.unwrap();

        assert_eq!(summary.total, 1);
        assert_eq!(summary.pass, 1);
    }

    #[tokio::test]
    async fn watch_polls_until_settled() {
        let client = MockCodeupClient::new()
            .with_detail(json!({"sourceCommitId": "abc"}))
            .with_check_runs(vec![json!({"name": "build", "status": "running"})])
            .with_check_runs(vec![json!({"name": "build", "status": "running"})])
            .with_check_runs(vec![json!({"name": "build", "status": "success"})]);

        let summary = run_checks(&args(true), &fast_config(), &client, &ctx())
            .await
            .unwrap();

        assert_eq!(summary.pending, 0);
        assert_eq!(summary.pass, 1);
        assert_eq!(*client.check_run_calls.lock().unwrap(), 3);
    }

    #[test]
    fn flag_overrides_config_timing() {
        let mut args = args(true);
        args.interval = Some(2);
        let watch = args.watch_config(&Config::default());
        assert_eq!(watch.interval.as_millis(), 2_000);
        assert_eq!(watch.timeout.as_millis(), 600_000);
    }

    #[test]
    fn summary_line_includes_status() {
        let summary = ChecksSummary {
            total: 3,
            pass: 1,
            fail: 1,
            pending: 1,
            neutral: 0,
            checks: Vec::new(),
            pull_request_status: Some("UNDER_REVIEW".to_string()),
        };
        assert_eq!(
            summary_line(&summary),
            "3 checks: 1 passed, 1 failed, 1 pending, 0 neutral (change request: UNDER_REVIEW)"
        );
    }
}
