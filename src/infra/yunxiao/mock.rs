//! wiremock-based Yunxiao mock server for testing.
//!
//! ```ignore
//! let mock = YunxiaoMockServer::start().await;
//! let ctx = mock.repo("org", "group/repo");
//! ctx.patchsets(1, json!([...])).await;
//! ctx.diff_tree(1, "from", "to", json!({...})).await;
//! let client = mock.client();
//! ```

use serde_json::Value;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::client::{YunxiaoClient, change_request_path, encode_segment, repository_path};

pub struct YunxiaoMockServer {
    server: MockServer,
}

impl YunxiaoMockServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// A client pointed at this server.
    pub fn client(&self) -> YunxiaoClient {
        YunxiaoClient::new(&self.server.uri(), "test-token").unwrap()
    }

    pub fn repo<'a>(&'a self, org: &'a str, repo: &'a str) -> MockRepoContext<'a> {
        MockRepoContext {
            server: &self.server,
            org,
            repo,
        }
    }
}

/// Repository-scoped mock builders.
pub struct MockRepoContext<'a> {
    server: &'a MockServer,
    org: &'a str,
    repo: &'a str,
}

fn ok(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

impl MockRepoContext<'_> {
    fn cr_path(&self, local_id: u64) -> String {
        change_request_path(self.org, self.repo, local_id)
    }

    fn repo_path(&self) -> String {
        repository_path(self.org, self.repo)
    }

    pub async fn patchsets(&self, local_id: u64, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("{}/diffs/patches", self.cr_path(local_id))))
            .respond_with(ok(body))
            .mount(self.server)
            .await;
    }

    pub async fn diff_tree(&self, local_id: u64, from: &str, to: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("{}/diffs/changeTree", self.cr_path(local_id))))
            .and(query_param("fromPatchSetBizId", from))
            .and(query_param("toPatchSetBizId", to))
            .respond_with(ok(body))
            .mount(self.server)
            .await;
    }

    pub async fn diff_tree_unavailable(&self, local_id: u64) {
        Mock::given(method("GET"))
            .and(path(format!("{}/diffs/changeTree", self.cr_path(local_id))))
            .respond_with(ResponseTemplate::new(501).set_body_json(serde_json::json!({
                "errorCode": "NotImplemented",
                "errorMessage": "changeTree is not supported"
            })))
            .mount(self.server)
            .await;
    }

    pub async fn detail(&self, local_id: u64, body: Value) {
        Mock::given(method("GET"))
            .and(path(self.cr_path(local_id)))
            .respond_with(ok(body))
            .mount(self.server)
            .await;
    }

    pub async fn comments(&self, local_id: u64, comment_type: &str, body: Value) {
        Mock::given(method("POST"))
            .and(path(format!("{}/comments/list", self.cr_path(local_id))))
            .and(body_partial_json(
                serde_json::json!({"comment_type": comment_type}),
            ))
            .respond_with(ok(body))
            .mount(self.server)
            .await;
    }

    pub async fn check_runs(&self, git_ref: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("{}/checkRuns", self.repo_path())))
            .and(query_param("ref", git_ref))
            .respond_with(ok(body))
            .mount(self.server)
            .await;
    }

    pub async fn commit_statuses(&self, sha: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!(
                "{}/commits/{}/statuses",
                self.repo_path(),
                encode_segment(sha)
            )))
            .respond_with(ok(body))
            .mount(self.server)
            .await;
    }

    pub async fn compare(&self, from: &str, to: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("{}/compares", self.repo_path())))
            .and(query_param("from", from))
            .and(query_param("to", to))
            .respond_with(ok(body))
            .mount(self.server)
            .await;
    }
}
