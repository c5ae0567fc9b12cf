//! Test utilities for creating temporary git repositories.

use git2::Repository;
use tempfile::TempDir;

use super::repo::open_repo_at;

/// A temporary git repository with a Codeup origin remote.
pub struct TempRepo {
    pub dir: TempDir,
}

impl TempRepo {
    pub fn new(org: &str, repo_path: &str, branch: &str) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let repo = Repository::init(dir.path()).expect("init repo");

        // Initial commit so HEAD exists
        {
            let sig = git2::Signature::now("Test", "test@example.com").unwrap();
            let tree_id = repo.index().unwrap().write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
                .expect("create initial commit");
        }

        {
            let head = repo.head().expect("get head");
            let current_branch = head.shorthand().unwrap_or("master").to_string();
            drop(head);
            if current_branch != branch {
                let mut branch_ref = repo
                    .find_branch(&current_branch, git2::BranchType::Local)
                    .expect("find branch");
                branch_ref.rename(branch, true).expect("rename branch");
            }
        }

        let url = format!("https://codeup.aliyun.com/{org}/{repo_path}.git");
        repo.remote("origin", &url).expect("set origin");

        Self { dir }
    }

    pub fn open(&self) -> Repository {
        open_repo_at(self.dir.path()).expect("open temp repo")
    }
}
