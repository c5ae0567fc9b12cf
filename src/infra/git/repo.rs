//! Repository operations.

use git2::Repository;
use std::path::Path;

use super::error::{GitError, Result};

/// Open a git repository from the current directory or any parent.
pub fn open_repo() -> Result<Repository> {
    Repository::open_from_env().map_err(|_| GitError::NotInRepo.into())
}

/// Open a git repository from a specific path.
pub fn open_repo_at(path: &Path) -> Result<Repository> {
    use git2::RepositoryOpenFlags;
    Repository::open_ext(
        path,
        RepositoryOpenFlags::empty(),
        std::iter::empty::<&Path>(),
    )
    .map_err(|_| GitError::NotInRepo.into())
}

/// Get the remote URL for "origin".
pub fn origin_url(repo: &Repository) -> Result<String> {
    let remote = repo
        .find_remote("origin")
        .map_err(|_| GitError::NoOriginRemote)?;
    remote
        .url()
        .map(str::to_string)
        .ok_or_else(|| GitError::NoOriginRemote.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::git::test_utils::TempRepo;
    use tempfile::TempDir;

    #[test]
    fn open_repo_at_rejects_plain_directory() {
        let dir = TempDir::new().unwrap();
        let err = open_repo_at(dir.path()).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<GitError>(),
            Some(GitError::NotInRepo)
        ));
    }

    #[test]
    fn origin_url_reads_remote() {
        let temp = TempRepo::new("org-1", "group/repo", "main");
        let url = origin_url(&temp.open()).unwrap();
        assert_eq!(url, "https://codeup.aliyun.com/org-1/group/repo.git");
    }

    #[test]
    fn origin_url_missing_remote() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let err = origin_url(&repo).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GitError>(),
            Some(GitError::NoOriginRemote)
        ));
    }
}
