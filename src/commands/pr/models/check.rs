//! Aggregation of CI checks, commit statuses and review opinions into one
//! pass/fail/pending summary.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use crate::shared::json::{first_array, first_str};

const EMBEDDED_CHECK_KEYS: &[&str] = &[
    "checkRuns",
    "checks",
    "commitStatuses",
    "statuses",
    "statusChecks",
    "pipelineStatuses",
];
const NAME_KEYS: &[&str] = &["name", "context", "checkName", "title"];
const STATUS_KEYS: &[&str] = &["conclusion", "status", "state", "result"];
const DESCRIPTION_KEYS: &[&str] = &["description", "summary", "output.summary", "output.title"];
const URL_KEYS: &[&str] = &["detailsUrl", "targetUrl", "url", "htmlUrl", "webUrl"];
const PR_STATUS_KEYS: &[&str] = &["status", "state", "mergeStatus"];
const REVIEWER_KEYS: &[&str] = &["reviewers", "reviewerList"];
const REVIEWER_NAME_KEYS: &[&str] = &["name", "username", "userName", "userId", "id"];
const OPINION_KEYS: &[&str] = &["reviewOpinionStatus", "reviewOpinion", "opinion", "status"];

const FAIL_WORDS: &[&str] = &[
    "fail", "error", "conflict", "reject", "cancel", "timeout", "blocked",
];
const PASS_WORDS: &[&str] = &[
    "success", "succeed", "passed", "pass", "ok", "approve", "merge", "done", "resolved",
];
const PENDING_WORDS: &[&str] = &[
    "pending", "running", "checking", "wait", "queue", "process", "review", "open", "under_",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Conclusion {
    Pass,
    Fail,
    Pending,
    Neutral,
}

impl Conclusion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Pending => "pending",
            Self::Neutral => "neutral",
        }
    }
}

/// Classify a free-form status string. Exact merge-check values win, then
/// failure words, then success words, then in-progress words.
pub fn classify_status(status: &str) -> Conclusion {
    let status = status.trim().to_lowercase();
    match status.as_str() {
        "no_conflict" => return Conclusion::Pass,
        "has_conflict" => return Conclusion::Fail,
        "checking" => return Conclusion::Pending,
        "" => return Conclusion::Neutral,
        _ => {}
    }

    let has_any = |words: &[&str]| words.iter().any(|word| status.contains(word));
    if has_any(FAIL_WORDS) {
        Conclusion::Fail
    } else if has_any(PASS_WORDS) {
        Conclusion::Pass
    } else if has_any(PENDING_WORDS) {
        Conclusion::Pending
    } else {
        Conclusion::Neutral
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckItem {
    pub name: String,
    pub status: String,
    pub conclusion: Conclusion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecksSummary {
    pub total: usize,
    pub pass: usize,
    pub fail: usize,
    pub pending: usize,
    pub neutral: usize,
    pub checks: Vec<CheckItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request_status: Option<String>,
}

impl ChecksSummary {
    /// The counts a watcher reports changes on.
    pub fn progress(&self) -> (usize, usize, usize, usize) {
        (self.pass, self.fail, self.pending, self.total)
    }
}

fn check_item(raw: &Value) -> CheckItem {
    let status = first_str(raw, STATUS_KEYS).unwrap_or_else(|| "unknown".to_string());
    CheckItem {
        name: first_str(raw, NAME_KEYS).unwrap_or_else(|| "(unnamed)".to_string()),
        conclusion: classify_status(&status),
        status,
        description: first_str(raw, DESCRIPTION_KEYS),
        url: first_str(raw, URL_KEYS),
    }
}

/// Review opinions use `PASS`/`NOT_PASS`, which substring matching would
/// both read as passing.
fn review_item(reviewer: &Value) -> CheckItem {
    let name = first_str(reviewer, REVIEWER_NAME_KEYS).unwrap_or_else(|| "(unknown)".to_string());
    let opinion = first_str(reviewer, OPINION_KEYS).unwrap_or_default();
    let conclusion = match opinion.to_ascii_uppercase().as_str() {
        "PASS" | "APPROVED" => Conclusion::Pass,
        "NOT_PASS" | "REJECTED" => Conclusion::Fail,
        _ => Conclusion::Pending,
    };
    CheckItem {
        name: format!("review/{name}"),
        status: if opinion.is_empty() {
            "not_reviewed".to_string()
        } else {
            opinion
        },
        conclusion,
        description: None,
        url: None,
    }
}

/// Merge check runs, commit statuses, checks embedded in the change request
/// detail, and reviewer opinions. Items with the same
/// `(name, status, description)` are counted once.
pub fn summarize_checks(detail: &Value, check_runs: &[Value], statuses: &[Value]) -> ChecksSummary {
    let embedded = EMBEDDED_CHECK_KEYS
        .iter()
        .filter_map(|key| first_array(detail, &[*key]))
        .flatten();

    let items = check_runs
        .iter()
        .chain(statuses)
        .chain(embedded)
        .map(check_item)
        .chain(
            first_array(detail, REVIEWER_KEYS)
                .into_iter()
                .flatten()
                .map(review_item),
        );

    let mut seen = HashSet::new();
    let mut summary = ChecksSummary {
        pull_request_status: first_str(detail, PR_STATUS_KEYS),
        ..Default::default()
    };
    for item in items {
        if !seen.insert((item.name.clone(), item.status.clone(), item.description.clone())) {
            continue;
        }
        match item.conclusion {
            Conclusion::Pass => summary.pass += 1,
            Conclusion::Fail => summary.fail += 1,
            Conclusion::Pending => summary.pending += 1,
            Conclusion::Neutral => summary.neutral += 1,
        }
        summary.checks.push(item);
    }
    summary.total = summary.checks.len();
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::no_conflict("NO_CONFLICT", Conclusion::Pass)]
    #[case::has_conflict("has_conflict", Conclusion::Fail)]
    #[case::checking("CHECKING", Conclusion::Pending)]
    #[case::failure("FAILURE", Conclusion::Fail)]
    #[case::cancelled("cancelled", Conclusion::Fail)]
    #[case::success("success", Conclusion::Pass)]
    #[case::succeeded("SUCCEEDED", Conclusion::Pass)]
    #[case::resolved("resolved", Conclusion::Pass)]
    #[case::merging("merging", Conclusion::Pass)]
    #[case::blocked("BLOCKED", Conclusion::Fail)]
    #[case::queued("queued", Conclusion::Pending)]
    #[case::processing("PROCESSING", Conclusion::Pending)]
    #[case::under_review("UNDER_REVIEW", Conclusion::Pending)]
    #[case::completed("COMPLETED", Conclusion::Neutral)]
    #[case::in_progress("IN_PROGRESS", Conclusion::Neutral)]
    #[case::timed_out("timed_out", Conclusion::Neutral)]
    #[case::failure_beats_success("success_with_errors", Conclusion::Fail)]
    #[case::skipped("skipped", Conclusion::Neutral)]
    #[case::empty("  ", Conclusion::Neutral)]
    fn test_classify_status(#[case] status: &str, #[case] expected: Conclusion) {
        assert_eq!(classify_status(status), expected);
    }

    #[test]
    fn merges_all_sources() {
        let detail = json!({
            "status": "UNDER_REVIEW",
            "checkRuns": [{"name": "lint", "status": "running"}],
            "reviewers": [
                {"name": "alice", "reviewOpinionStatus": "PASS"},
                {"name": "bob", "reviewOpinionStatus": "NOT_PASS"},
                {"name": "carol"}
            ]
        });
        let runs = vec![json!({"name": "build", "conclusion": "success", "detailsUrl": "https://ci/1"})];
        let statuses = vec![json!({"context": "deploy", "state": "error"})];

        let summary = summarize_checks(&detail, &runs, &statuses);

        assert_eq!(summary.total, 6);
        assert_eq!(summary.pass, 2);
        assert_eq!(summary.fail, 2);
        assert_eq!(summary.pending, 2);
        assert_eq!(summary.neutral, 0);
        assert_eq!(summary.pull_request_status.as_deref(), Some("UNDER_REVIEW"));
        assert_eq!(summary.checks[0].url.as_deref(), Some("https://ci/1"));
        assert_eq!(summary.checks[5].status, "not_reviewed");
    }

    #[test]
    fn duplicates_count_once() {
        let run = json!({"name": "build", "status": "success", "url": "u"});
        let detail = json!({"checks": [run.clone()]});

        let summary = summarize_checks(&detail, &[run.clone(), run.clone()], &[]);

        assert_eq!(summary.total, 1);
        assert_eq!(summary.pass, 1);
    }

    #[test]
    fn different_descriptions_both_kept() {
        let runs = vec![
            json!({"name": "build", "status": "success", "description": "linux"}),
            json!({"name": "build", "status": "success", "description": "macos"}),
        ];
        let summary = summarize_checks(&Value::Null, &runs, &[]);
        assert_eq!(summary.total, 2);
    }

    #[test]
    fn url_does_not_split_duplicates() {
        let runs = vec![
            json!({"name": "build", "status": "success", "url": "https://ci/1"}),
            json!({"name": "build", "status": "success", "url": "https://ci/2"}),
        ];
        let summary = summarize_checks(&Value::Null, &runs, &[]);
        assert_eq!(summary.total, 1);
        assert_eq!(summary.checks[0].url.as_deref(), Some("https://ci/1"));
    }

    #[test]
    fn tallies_success_failure_pending() {
        let runs: Vec<Value> = ["success", "failure", "pending"]
            .iter()
            .map(|s| json!({"name": format!("ci-{s}"), "status": s}))
            .collect();

        let summary = summarize_checks(&Value::Null, &runs, &[]);

        assert_eq!(
            (summary.pass, summary.fail, summary.pending, summary.total),
            (1, 1, 1, 3)
        );
    }

    #[test]
    fn same_name_different_status_both_kept() {
        let runs = vec![
            json!({"name": "build", "status": "success"}),
            json!({"name": "build", "status": "failure"}),
        ];
        let summary = summarize_checks(&Value::Null, &runs, &[]);
        assert_eq!(summary.total, 2);
    }

    #[test]
    fn counts_add_up() {
        let runs: Vec<Value> = ["success", "failure", "queued", "skipped", "", "weird"]
            .iter()
            .enumerate()
            .map(|(i, s)| json!({"name": format!("c{i}"), "status": s}))
            .collect();

        let summary = summarize_checks(&json!({}), &runs, &[]);

        assert_eq!(
            summary.pass + summary.fail + summary.pending + summary.neutral,
            summary.total
        );
        assert_eq!(summary.total, 6);
        assert_eq!(summary.checks[4].status, "unknown");
    }

    #[test]
    fn missing_fields_get_placeholders() {
        let summary = summarize_checks(&Value::Null, &[json!({})], &[]);
        assert_eq!(summary.checks[0].name, "(unnamed)");
        assert_eq!(summary.checks[0].conclusion, Conclusion::Neutral);
    }
}
