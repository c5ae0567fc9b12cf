//! Change request (pull request) endpoints.
//!
//! Payloads are returned as loosely-typed JSON; field extraction lives with
//! the models that consume them.

use serde_json::{Value, json};

use super::client::{YunxiaoClient, change_request_path, encode_segment, repository_path};
use super::error::Result;
use crate::shared::json::{first_array, first_str, list_items};

/// One comment listing query: a `comment_type × state` combination plus
/// optional server-side filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentQuery {
    pub comment_type: String,
    pub state: String,
    pub resolved: Option<bool>,
    pub file_path: Option<String>,
}

/// The remote capability the review commands are built on.
#[async_trait::async_trait]
pub trait CodeupClient: Send + Sync {
    /// All patchsets (revisions) of a change request, in API order.
    async fn fetch_patchsets(&self, org: &str, repo: &str, local_id: u64) -> Result<Vec<Value>>;

    /// The changed-file tree between two patchsets. May be unavailable for a tenant.
    async fn fetch_diff_tree(
        &self,
        org: &str,
        repo: &str,
        local_id: u64,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Value>;

    async fn fetch_change_request_detail(
        &self,
        org: &str,
        repo: &str,
        local_id: u64,
    ) -> Result<Value>;

    async fn fetch_comments(
        &self,
        org: &str,
        repo: &str,
        local_id: u64,
        query: &CommentQuery,
    ) -> Result<Vec<Value>>;

    async fn fetch_check_runs(&self, org: &str, repo: &str, git_ref: &str) -> Result<Vec<Value>>;

    async fn fetch_commit_statuses(&self, org: &str, repo: &str, sha: &str) -> Result<Vec<Value>>;

    /// Unified diff text between two commits.
    async fn fetch_compare_patch(
        &self,
        org: &str,
        repo: &str,
        from_sha: &str,
        to_sha: &str,
    ) -> Result<String>;

    /// Submit a review opinion with a caller-built payload.
    async fn submit_review(
        &self,
        org: &str,
        repo: &str,
        local_id: u64,
        payload: &Value,
    ) -> Result<Value>;
}

/// Join the per-file `diff` fields of a compare response into one patch.
pub fn compare_patch_text(value: &Value) -> String {
    if let Some(text) = value.as_str() {
        return text.to_string();
    }

    let diffs = first_array(value, &["diffs", "result.diffs", "files"])
        .cloned()
        .unwrap_or_default();
    let mut patch = String::new();
    for diff in &diffs {
        if let Some(text) = first_str(diff, &["diff", "patch", "content"]) {
            patch.push_str(&text);
            if !text.ends_with('\n') {
                patch.push('\n');
            }
        }
    }
    patch
}

#[async_trait::async_trait]
impl CodeupClient for YunxiaoClient {
    async fn fetch_patchsets(&self, org: &str, repo: &str, local_id: u64) -> Result<Vec<Value>> {
        let path = format!(
            "{}/diffs/patches",
            change_request_path(org, repo, local_id)
        );
        Ok(list_items(self.get_json(&path, &[]).await?))
    }

    async fn fetch_diff_tree(
        &self,
        org: &str,
        repo: &str,
        local_id: u64,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Value> {
        let path = format!(
            "{}/diffs/changeTree",
            change_request_path(org, repo, local_id)
        );
        let mut query = Vec::new();
        if let Some(from) = from {
            query.push(("fromPatchSetBizId", from.to_string()));
        }
        if let Some(to) = to {
            query.push(("toPatchSetBizId", to.to_string()));
        }
        self.get_json(&path, &query).await
    }

    async fn fetch_change_request_detail(
        &self,
        org: &str,
        repo: &str,
        local_id: u64,
    ) -> Result<Value> {
        self.get_json(&change_request_path(org, repo, local_id), &[])
            .await
    }

    async fn fetch_comments(
        &self,
        org: &str,
        repo: &str,
        local_id: u64,
        query: &CommentQuery,
    ) -> Result<Vec<Value>> {
        let path = format!(
            "{}/comments/list",
            change_request_path(org, repo, local_id)
        );
        let mut payload = json!({
            "comment_type": query.comment_type,
            "state": query.state,
        });
        if let Some(resolved) = query.resolved {
            payload["resolved"] = json!(resolved);
        }
        if let Some(file_path) = &query.file_path {
            payload["file_path"] = json!(file_path);
        }
        Ok(list_items(self.post_json(&path, &payload).await?))
    }

    async fn fetch_check_runs(&self, org: &str, repo: &str, git_ref: &str) -> Result<Vec<Value>> {
        let path = format!("{}/checkRuns", repository_path(org, repo));
        let value = self.get_json(&path, &[("ref", git_ref.to_string())]).await?;
        Ok(list_items(value))
    }

    async fn fetch_commit_statuses(&self, org: &str, repo: &str, sha: &str) -> Result<Vec<Value>> {
        let path = format!(
            "{}/commits/{}/statuses",
            repository_path(org, repo),
            encode_segment(sha)
        );
        Ok(list_items(self.get_json(&path, &[]).await?))
    }

    async fn fetch_compare_patch(
        &self,
        org: &str,
        repo: &str,
        from_sha: &str,
        to_sha: &str,
    ) -> Result<String> {
        let path = format!("{}/compares", repository_path(org, repo));
        let query = [("from", from_sha.to_string()), ("to", to_sha.to_string())];
        let value = self.get_json(&path, &query).await?;
        Ok(compare_patch_text(&value))
    }

    async fn submit_review(
        &self,
        org: &str,
        repo: &str,
        local_id: u64,
        payload: &Value,
    ) -> Result<Value> {
        let path = format!("{}/review", change_request_path(org, repo, local_id));
        self.post_json(&path, payload).await
    }
}
