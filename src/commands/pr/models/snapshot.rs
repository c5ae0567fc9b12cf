//! Changed-file summaries for a patchset range.
//!
//! The `changeTree` endpoint is preferred. Some tenants do not expose it,
//! so a failure degrades to the aggregate counts on the change request
//! detail and the snapshot carries a warning instead of an error.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::patchset::{Patchset, PatchsetRange, find};
use crate::commands::pr::common::RepoContext;
use crate::commands::pr::error::{PrError, Result};
use crate::infra::yunxiao::CodeupClient;
use crate::shared::json::{first_array, first_bool, first_i64, first_str};

const FILE_CONTAINER_KEYS: &[&str] = &[
    "changedTreeItems",
    "changedFilesInfos",
    "changedFiles",
    "files",
    "items",
    "result.changedTreeItems",
    "result.changedFilesInfos",
    "result.files",
];
const NEW_PATH_KEYS: &[&str] = &[
    "newPath",
    "new_path",
    "newFilePath",
    "path",
    "filePath",
    "file_path",
    "name",
];
const OLD_PATH_KEYS: &[&str] = &["oldPath", "old_path", "oldFilePath"];
const ADDITION_KEYS: &[&str] = &["addLines", "additions", "added", "addedLines", "add_lines"];
const DELETION_KEYS: &[&str] = &["delLines", "deletions", "deleted", "deletedLines", "del_lines"];
const RENAMED_KEYS: &[&str] = &["renamedFile", "renamed", "isRenamed", "renamed_file"];
const BINARY_KEYS: &[&str] = &["binary", "isBinary", "binaryFile", "binary_file"];

const COUNT_KEYS: &[&str] = &[
    "changedFilesCount",
    "changed_files_count",
    "totalFiles",
    "fileCount",
    "result.changedFilesCount",
];
const TOTAL_ADDITION_KEYS: &[&str] = &[
    "totalAddLines",
    "totalAdditions",
    "additions",
    "addLines",
    "result.totalAddLines",
];
const TOTAL_DELETION_KEYS: &[&str] = &[
    "totalDelLines",
    "totalDeletions",
    "deletions",
    "delLines",
    "result.totalDelLines",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedFile {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additions: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletions: Option<i64>,
    pub renamed: bool,
    pub binary: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub changed_files_count: usize,
    pub total_additions: i64,
    pub total_deletions: i64,
    pub files: Vec<ChangedFile>,
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSnapshot {
    pub range: PatchsetRange,
    pub summary: DiffSummary,
    /// The untouched `changeTree` response, kept for `--raw`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

fn parse_file(raw: &Value) -> Option<ChangedFile> {
    let old_path = first_str(raw, OLD_PATH_KEYS);
    let path = first_str(raw, NEW_PATH_KEYS).or_else(|| old_path.clone())?;
    let renamed = first_bool(raw, RENAMED_KEYS)
        .unwrap_or_else(|| old_path.as_ref().is_some_and(|old| *old != path));

    Some(ChangedFile {
        old_path: old_path.filter(|old| *old != path),
        path,
        additions: first_i64(raw, ADDITION_KEYS),
        deletions: first_i64(raw, DELETION_KEYS),
        renamed,
        binary: first_bool(raw, BINARY_KEYS).unwrap_or(false),
    })
}

fn file_entries(tree: &Value) -> Vec<ChangedFile> {
    let entries = match tree {
        Value::Array(items) => Some(items),
        other => first_array(other, FILE_CONTAINER_KEYS),
    };
    entries
        .map(|items| items.iter().filter_map(parse_file).collect())
        .unwrap_or_default()
}

/// Summarize a `changeTree` response, keeping at most `limit` files (at
/// least one).
pub fn summarize_tree(tree: &Value, limit: usize) -> DiffSummary {
    let all = file_entries(tree);
    let object = if tree.is_object() { tree } else { &Value::Null };

    let count = first_i64(object, COUNT_KEYS)
        .and_then(|c| usize::try_from(c).ok())
        .map_or(all.len(), |c| c.max(all.len()));
    let total_additions = first_i64(object, TOTAL_ADDITION_KEYS)
        .unwrap_or_else(|| all.iter().filter_map(|f| f.additions).sum());
    let total_deletions = first_i64(object, TOTAL_DELETION_KEYS)
        .unwrap_or_else(|| all.iter().filter_map(|f| f.deletions).sum());

    let files: Vec<ChangedFile> = all.into_iter().take(limit.max(1)).collect();
    DiffSummary {
        truncated: count > files.len(),
        changed_files_count: count,
        total_additions,
        total_deletions,
        files,
    }
}

/// Counts-only summary from a change request detail.
pub fn summarize_detail(detail: &Value) -> DiffSummary {
    let count = first_i64(detail, COUNT_KEYS)
        .and_then(|c| usize::try_from(c).ok())
        .unwrap_or(0);
    DiffSummary {
        changed_files_count: count,
        total_additions: first_i64(detail, TOTAL_ADDITION_KEYS).unwrap_or(0),
        total_deletions: first_i64(detail, TOTAL_DELETION_KEYS).unwrap_or(0),
        files: Vec::new(),
        truncated: count > 0,
    }
}

/// Build a snapshot for `range`. Never fails: an unavailable tree endpoint
/// yields a counts-only summary with a warning.
pub async fn build_snapshot(
    client: &dyn CodeupClient,
    ctx: &RepoContext,
    local_id: u64,
    range: &PatchsetRange,
    limit: usize,
) -> DiffSnapshot {
    let tree = client
        .fetch_diff_tree(
            &ctx.organization_id,
            &ctx.repository_id,
            local_id,
            range.from.as_deref(),
            range.to.as_deref(),
        )
        .await;

    match tree {
        Ok(raw) => DiffSnapshot {
            range: range.clone(),
            summary: summarize_tree(&raw, limit),
            raw: Some(raw),
            warning: None,
        },
        Err(e) => {
            warn!(error = %e, "changeTree unavailable, falling back to change request detail");
            let detail = client
                .fetch_change_request_detail(&ctx.organization_id, &ctx.repository_id, local_id)
                .await
                .unwrap_or_else(|detail_err| {
                    warn!(error = %detail_err, "change request detail unavailable");
                    Value::Null
                });
            DiffSnapshot {
                range: range.clone(),
                summary: summarize_detail(&detail),
                raw: None,
                warning: Some(format!(
                    "Per-file diff is unavailable ({e}); showing aggregate counts from the change request"
                )),
            }
        }
    }
}

/// Forward-slash form of a path as reported by the API.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// A path matches a filter when equal, or when it ends with `/filter`.
pub fn path_matches(path: &str, filter: &str) -> bool {
    let path = normalize_path(path);
    let filter = normalize_path(filter);
    let filter = filter.trim_start_matches("./");
    !filter.is_empty() && (path == filter || path.ends_with(&format!("/{filter}")))
}

/// Keep only files matching one of `filters`, recomputing the totals.
/// An empty filter list returns the summary unchanged.
pub fn filter_by_paths(summary: &DiffSummary, filters: &[String]) -> DiffSummary {
    if filters.is_empty() {
        return summary.clone();
    }

    let files: Vec<ChangedFile> = summary
        .files
        .iter()
        .filter(|f| {
            filters.iter().any(|filter| {
                path_matches(&f.path, filter)
                    || f.old_path.as_deref().is_some_and(|old| path_matches(old, filter))
            })
        })
        .cloned()
        .collect();

    DiffSummary {
        changed_files_count: files.len(),
        total_additions: files.iter().filter_map(|f| f.additions).sum(),
        total_deletions: files.iter().filter_map(|f| f.deletions).sum(),
        files,
        truncated: false,
    }
}

/// Map the range's patchset IDs to commit SHAs for the compare endpoint.
pub fn resolve_patch_commits(
    patchsets: &[Patchset],
    range: &PatchsetRange,
) -> Result<(String, String)> {
    let from = range.from.as_deref().ok_or(PrError::MissingParameter {
        what: "the base patchset",
        flag: "--from",
    })?;
    let to = range.to.as_deref().ok_or(PrError::MissingParameter {
        what: "the head patchset",
        flag: "--to",
    })?;

    let commit = |id: &str| find(patchsets, id).and_then(|p| p.commit_id.clone());
    match (commit(from), commit(to)) {
        (Some(from_sha), Some(to_sha)) => Ok((from_sha, to_sha)),
        _ => Err(PrError::MissingCommit {
            from: from.to_string(),
            to: to.to_string(),
        }
        .into()),
    }
}
